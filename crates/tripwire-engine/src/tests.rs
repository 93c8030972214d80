use std::sync::Arc;

use serde_json::{Value, json};
use uuid::Uuid;

use tripwire_core::{
  alert::Alert,
  event::{Event, NewEvent},
  event_type::{EventType, FieldKind, NewEventType},
  index::Pagination,
  trigger::{JobRequest, JobType, NewTrigger, TriggerUpdate},
};
use tripwire_index_mem::{MemIndex, RecordingJobSubmitter, StaticServiceRegistry};

use crate::{Error, Workflow};

type TestWorkflow =
  Workflow<MemIndex, StaticServiceRegistry, RecordingJobSubmitter>;

struct Harness {
  workflow: TestWorkflow,
  index:    Arc<MemIndex>,
  jobs:     Arc<RecordingJobSubmitter>,
}

fn harness() -> Harness {
  harness_with_registry(StaticServiceRegistry::with_services(["ddd5134"]))
}

fn harness_with_registry(registry: StaticServiceRegistry) -> Harness {
  let index = Arc::new(MemIndex::new());
  let jobs = Arc::new(RecordingJobSubmitter::new());
  let workflow = Workflow::new(
    Arc::clone(&index),
    Arc::new(registry),
    Arc::clone(&jobs),
  );
  Harness { workflow, index, jobs }
}

async fn register_type(workflow: &TestWorkflow, name: &str) -> EventType {
  workflow
    .event_types
    .register(NewEventType {
      name:    name.into(),
      mapping: [
        ("num".to_string(), FieldKind::Integer),
        ("str".to_string(), FieldKind::String),
      ]
      .into_iter()
      .collect(),
    })
    .await
    .unwrap()
}

fn job_template(service_id: &str) -> JobRequest {
  JobRequest {
    created_by: Some("test-harness".into()),
    job_type:   JobType {
      kind: "execute-service".into(),
      data: json!({
        "dataInputs": { "": { "content": "$str", "type": "body" } },
        "serviceId": service_id,
      })
      .as_object()
      .unwrap()
      .clone(),
    },
  }
}

fn trigger_input(event_type_id: Uuid, condition: Value) -> NewTrigger {
  NewTrigger {
    name: "high-num".into(),
    enabled: true,
    event_type_id,
    condition: condition.into(),
    job: job_template("ddd5134"),
  }
}

async fn post_event(
  workflow: &TestWorkflow,
  event_type_id: Uuid,
  data: Value,
) -> (Event, Vec<Alert>) {
  workflow
    .events
    .post(NewEvent {
      event_type_id,
      created_on: None,
      data: serde_json::from_value(data).unwrap(),
    })
    .await
    .unwrap()
}

// ─── End-to-end pipeline ─────────────────────────────────────────────────────

#[tokio::test]
async fn matching_event_emits_one_alert() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  let trigger = h
    .workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await
    .unwrap();

  let (event, alerts) = post_event(
    &h.workflow,
    event_type.event_type_id,
    json!({ "num": 17, "str": "quick" }),
  )
  .await;

  assert_eq!(alerts.len(), 1);
  assert_eq!(alerts[0].trigger_id, trigger.trigger_id);
  assert_eq!(alerts[0].event_id, event.event_id);

  let (listed, total) = h.workflow.alerts.list(&Pagination::default()).await.unwrap();
  assert_eq!(total, 1);
  assert_eq!(listed[0].alert_id, alerts[0].alert_id);
}

#[tokio::test]
async fn non_matching_event_emits_nothing() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  h.workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await
    .unwrap();

  let (_, alerts) = post_event(
    &h.workflow,
    event_type.event_type_id,
    json!({ "num": 5, "str": "quick" }),
  )
  .await;

  assert!(alerts.is_empty());
  assert!(h.jobs.submitted().is_empty());
}

#[tokio::test]
async fn range_condition_matches() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  h.workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "range": { "data.num": { "gte": 10 } } }),
    ))
    .await
    .unwrap();

  let (_, alerts) =
    post_event(&h.workflow, event_type.event_type_id, json!({ "num": 12 }))
      .await;
  assert_eq!(alerts.len(), 1);

  let (_, alerts) =
    post_event(&h.workflow, event_type.event_type_id, json!({ "num": 9 }))
      .await;
  assert!(alerts.is_empty());
}

// ─── Namespacing ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn conditions_are_isolated_per_event_type() {
  let h = harness();
  let type_a = register_type(&h.workflow, "EventTypeA").await;
  let type_b = register_type(&h.workflow, "EventTypeB").await;

  // Both types declare `num`; the trigger is bound to type A only.
  h.workflow
    .triggers
    .create(trigger_input(
      type_a.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await
    .unwrap();

  let (_, alerts) =
    post_event(&h.workflow, type_b.event_type_id, json!({ "num": 17 })).await;
  assert!(alerts.is_empty());

  let (_, alerts) =
    post_event(&h.workflow, type_a.event_type_id, json!({ "num": 17 })).await;
  assert_eq!(alerts.len(), 1);
}

#[tokio::test]
async fn reserved_correlation_field_matches_across_types() {
  let h = harness();
  let type_a = register_type(&h.workflow, "EventTypeA").await;
  let type_b = register_type(&h.workflow, "EventTypeB").await;

  // `userName` is reserved, so the condition key stays unqualified and the
  // trigger fires for any event type carrying the value.
  h.workflow
    .triggers
    .create(trigger_input(
      type_a.event_type_id,
      json!({ "match": { "data.userName": "my-api-key-38n987" } }),
    ))
    .await
    .unwrap();

  let (_, alerts) = post_event(
    &h.workflow,
    type_b.event_type_id,
    json!({ "num": 1, "userName": "my-api-key-38n987" }),
  )
  .await;
  assert_eq!(alerts.len(), 1);
}

// ─── Trigger lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn trigger_round_trips_through_the_store() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  let condition = json!({
    "bool": { "must": [ { "match": { "data.str": "quick" } } ] }
  });
  let created = h
    .workflow
    .triggers
    .create(trigger_input(event_type.event_type_id, condition.clone()))
    .await
    .unwrap();

  // Dotted condition keys survive the stored-key escaping.
  let fetched = h.workflow.triggers.get(created.trigger_id).await.unwrap();
  assert_eq!(fetched.condition, condition.into());
  assert_eq!(fetched.name, created.name);
  assert_eq!(fetched.percolation_id, created.percolation_id);
}

#[tokio::test]
async fn failed_persistence_rolls_back_the_registration() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  h.index.fail_next_post("trigger").await;
  let result = h
    .workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await;

  assert!(matches!(result, Err(Error::Upstream { .. })));
  assert_eq!(h.index.registered_query_count().await, 0);

  let (triggers, total) =
    h.workflow.triggers.list(&Pagination::default()).await.unwrap();
  assert!(triggers.is_empty());
  assert_eq!(total, 0);
}

#[tokio::test]
async fn trigger_delete_is_idempotent_and_removes_the_registration() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  let trigger = h
    .workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await
    .unwrap();
  assert_eq!(h.index.registered_query_count().await, 1);

  assert!(h.workflow.triggers.delete(trigger.trigger_id).await.unwrap());
  assert_eq!(h.index.registered_query_count().await, 0);
  assert!(!h.workflow.triggers.delete(trigger.trigger_id).await.unwrap());

  // The condition no longer fires.
  let (_, alerts) =
    post_event(&h.workflow, event_type.event_type_id, json!({ "num": 17 }))
      .await;
  assert!(alerts.is_empty());
}

#[tokio::test]
async fn disabled_trigger_emits_nothing() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  let trigger = h
    .workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await
    .unwrap();

  let updated = h
    .workflow
    .triggers
    .update(trigger.trigger_id, TriggerUpdate { enabled: false })
    .await
    .unwrap();
  assert!(!updated.enabled);

  let (_, alerts) =
    post_event(&h.workflow, event_type.event_type_id, json!({ "num": 17 }))
      .await;
  assert!(alerts.is_empty());
  assert!(h.jobs.submitted().is_empty());

  // Re-enabling restores emission without re-registering anything.
  h.workflow
    .triggers
    .update(trigger.trigger_id, TriggerUpdate { enabled: true })
    .await
    .unwrap();
  let (_, alerts) =
    post_event(&h.workflow, event_type.event_type_id, json!({ "num": 17 }))
      .await;
  assert_eq!(alerts.len(), 1);
}

#[tokio::test]
async fn unknown_service_is_rejected_when_the_registry_answers() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  let mut input = trigger_input(
    event_type.event_type_id,
    json!({ "match": { "data.num": 17 } }),
  );
  input.job = job_template("no-such-service");

  let result = h.workflow.triggers.create(input).await;
  assert!(matches!(result, Err(Error::UnknownService(_))));
  assert_eq!(h.index.registered_query_count().await, 0);
}

#[tokio::test]
async fn unreachable_registry_skips_the_service_check() {
  let h = harness_with_registry(StaticServiceRegistry::unreachable());
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  let result = h
    .workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await;
  assert!(result.is_ok());
}

// ─── Event type lifecycle ────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_event_type_name_is_rejected() {
  let h = harness();
  register_type(&h.workflow, "EventTypeA").await;

  let result = h
    .workflow
    .event_types
    .register(NewEventType {
      name:    "EventTypeA".into(),
      mapping: [("other".to_string(), FieldKind::String)].into_iter().collect(),
    })
    .await;
  assert!(matches!(result, Err(Error::DuplicateName(_))));
}

#[tokio::test]
async fn event_type_delete_blocks_on_dependent_triggers() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  let trigger = h
    .workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await
    .unwrap();

  let blocked = h.workflow.delete_event_type(event_type.event_type_id).await;
  assert!(matches!(blocked, Err(Error::HasDependents(_, 1))));

  h.workflow.triggers.delete(trigger.trigger_id).await.unwrap();
  assert!(h.workflow.delete_event_type(event_type.event_type_id).await.unwrap());
  assert!(!h.workflow.delete_event_type(event_type.event_type_id).await.unwrap());
}

// ─── Event ingestion ─────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_event_type_is_rejected() {
  let h = harness();
  let result = h
    .workflow
    .events
    .post(NewEvent {
      event_type_id: Uuid::new_v4(),
      created_on:    None,
      data:          Default::default(),
    })
    .await;
  assert!(matches!(result, Err(Error::UnknownEventType(_))));
}

#[tokio::test]
async fn event_round_trips_with_flat_data() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  let (event, _) = post_event(
    &h.workflow,
    event_type.event_type_id,
    json!({ "num": 17, "str": "quick", "userName": "my-api-key-38n987" }),
  )
  .await;

  let fetched = h.workflow.events.get(event.event_id).await.unwrap();
  assert_eq!(fetched.data, event.data);
  assert_eq!(fetched.data["num"], json!(17));
  assert_eq!(fetched.data["userName"], json!("my-api-key-38n987"));

  let (events, total) =
    h.workflow.events.list(&Pagination::default()).await.unwrap();
  assert_eq!(total, 1);
  assert_eq!(events[0].event_id, event.event_id);

  assert!(h.workflow.events.delete(event.event_id).await.unwrap());
  assert!(!h.workflow.events.delete(event.event_id).await.unwrap());
}

#[tokio::test]
async fn object_valued_reserved_field_is_rejected() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  // An object under a reserved field would collide with the type-namespace
  // wrapper in the stored document and corrupt the read-back.
  let result = h
    .workflow
    .events
    .post(NewEvent {
      event_type_id: event_type.event_type_id,
      created_on:    None,
      data:          [
        ("num".to_string(), json!(17)),
        ("userName".to_string(), json!({ "nested": "x" })),
      ]
      .into_iter()
      .collect(),
    })
    .await;
  assert!(matches!(
    result,
    Err(Error::Core(tripwire_core::Error::InvalidEventData(_)))
  ));

  let (_, total) = h.workflow.events.list(&Pagination::default()).await.unwrap();
  assert_eq!(total, 0);
}

#[tokio::test]
async fn invalid_event_data_is_rejected() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  let result = h
    .workflow
    .events
    .post(NewEvent {
      event_type_id: event_type.event_type_id,
      created_on:    None,
      data:          [("num".to_string(), json!("not a number"))]
        .into_iter()
        .collect(),
    })
    .await;
  assert!(matches!(
    result,
    Err(Error::Core(tripwire_core::Error::InvalidEventData(_)))
  ));
}

// ─── Alert emission ──────────────────────────────────────────────────────────

#[tokio::test]
async fn submitted_job_is_rendered_from_the_event() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  h.workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await
    .unwrap();

  post_event(
    &h.workflow,
    event_type.event_type_id,
    json!({ "num": 17, "str": "quick brown fox" }),
  )
  .await;

  let submitted = h.jobs.submitted();
  assert_eq!(submitted.len(), 1);
  assert_eq!(
    submitted[0],
    json!({
      "createdBy": "test-harness",
      "jobType": {
        "type": "execute-service",
        "data": {
          "dataInputs": {
            "": { "content": "quick brown fox", "type": "body" }
          },
          "serviceId": "ddd5134",
        },
      },
    })
  );
}

#[tokio::test]
async fn failed_submission_records_no_alert_but_the_event_posts() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  h.workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await
    .unwrap();

  h.jobs.set_failing(true);
  let (event, alerts) =
    post_event(&h.workflow, event_type.event_type_id, json!({ "num": 17 }))
      .await;
  assert!(alerts.is_empty());

  // The event itself was stored despite the emission failure.
  assert!(h.workflow.events.get(event.event_id).await.is_ok());
  let (_, total) = h.workflow.alerts.list(&Pagination::default()).await.unwrap();
  assert_eq!(total, 0);
}

#[tokio::test]
async fn alerts_can_be_listed_by_trigger_and_deleted() {
  let h = harness();
  let event_type = register_type(&h.workflow, "EventTypeA").await;

  let trigger = h
    .workflow
    .triggers
    .create(trigger_input(
      event_type.event_type_id,
      json!({ "match": { "data.num": 17 } }),
    ))
    .await
    .unwrap();

  let mut emitted = Vec::new();
  for _ in 0..3 {
    let (_, mut alerts) =
      post_event(&h.workflow, event_type.event_type_id, json!({ "num": 17 }))
        .await;
    emitted.append(&mut alerts);
  }

  let (by_trigger, total) = h
    .workflow
    .alerts
    .list_by_trigger(trigger.trigger_id)
    .await
    .unwrap();
  assert_eq!(total, 3);
  assert!(by_trigger.iter().all(|a| a.trigger_id == trigger.trigger_id));

  let fetched = h.workflow.alerts.get(emitted[0].alert_id).await.unwrap();
  assert_eq!(fetched.event_id, emitted[0].event_id);

  for alert in &emitted {
    assert!(h.workflow.alerts.delete(alert.alert_id).await.unwrap());
  }
  let (_, total) = h.workflow.alerts.list(&Pagination::default()).await.unwrap();
  assert_eq!(total, 0);

  let absent = h.workflow.alerts.get(emitted[0].alert_id).await;
  assert!(matches!(absent, Err(Error::AlertNotFound(_))));
}
