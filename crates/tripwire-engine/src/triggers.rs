//! [`TriggerStore`] — trigger lifecycle and condition compilation.
//!
//! A trigger is only considered created once **both** its reverse-search
//! registration and its document persistence succeed. There is no atomic
//! multi-object transaction; correctness is enforced by explicit two-phase
//! compensation: if persistence fails after registration succeeded, the
//! orphaned registration is deleted before the error is returned.
//!
//! Per-trigger state machine:
//! `{absent} → [create] → {registered+persisted} → [disable/enable] →
//! {registered+persisted} → [delete] → {absent}`. No partial state is ever
//! externally observable.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use tripwire_core::{
  external::ServiceRegistry,
  index::{DocumentIndex, Pagination},
  query::{QueryNode, escape_keys, namespace_keys, unescape_keys},
  trigger::{NewTrigger, Trigger, TriggerUpdate},
};

use crate::{Error, Result, event_types::EventTypeRegistry, kind};

pub struct TriggerStore<I, R> {
  index:       Arc<I>,
  services:    Arc<R>,
  event_types: EventTypeRegistry<I>,
}

impl<I, R> Clone for TriggerStore<I, R> {
  fn clone(&self) -> Self {
    Self {
      index:       Arc::clone(&self.index),
      services:    Arc::clone(&self.services),
      event_types: self.event_types.clone(),
    }
  }
}

impl<I, R> TriggerStore<I, R>
where
  I: DocumentIndex,
  R: ServiceRegistry,
{
  pub fn new(
    index: Arc<I>,
    services: Arc<R>,
    event_types: EventTypeRegistry<I>,
  ) -> Self {
    Self { index, services, event_types }
  }

  /// Create a trigger: compile and register its condition, then persist the
  /// trigger document, rolling the registration back on failure.
  pub async fn create(&self, input: NewTrigger) -> Result<Trigger> {
    // 1. Resolve the event type; its declared fields decide which bare
    //    condition keys get qualified.
    let event_type = self.event_types.get(input.event_type_id).await?;

    // 2. Best-effort existence check of the action's target service. An
    //    unreachable registry means offline/test mode, not a failure.
    let service_id = input.job.service_id()?;
    match self.services.exists(service_id).await {
      Ok(true) => {}
      Ok(false) => return Err(Error::UnknownService(service_id.to_string())),
      Err(e) => tracing::debug!(
        service_id,
        error = %e,
        "service registry unreachable; skipping existence check"
      ),
    }

    // 3. Namespace the condition and register it as a reverse-search query.
    let trigger_id = Uuid::new_v4();
    let fields = event_type.namespace_fields();
    let namespaced =
      namespace_keys(input.condition.clone(), &event_type.name, &fields);
    let body = json!({ "query": Value::from(namespaced) });

    let percolation_id = self
      .index
      .register_reverse_query(trigger_id, body)
      .await
      .map_err(|e| Error::upstream("reverse-search query registration", e))?;

    let trigger = Trigger {
      trigger_id,
      name: input.name,
      enabled: input.enabled,
      event_type_id: input.event_type_id,
      condition: input.condition,
      job: input.job,
      percolation_id,
      created_on: Utc::now(),
    };

    // 4. Escape keys on the full trigger value and persist it. The condition
    //    may contain dotted keys, which the document schema would otherwise
    //    read as nested paths.
    let doc = escape_trigger(&trigger)?;
    let persisted = self.index.post(kind::TRIGGER, trigger_id, doc).await;

    // 5. Compensate: a failed persistence must not leave the registration
    //    behind.
    match persisted {
      Ok(outcome) if outcome.created => Ok(trigger),
      Ok(_) => {
        self
          .rollback_registration(percolation_id, "document not created")
          .await?;
        Err(Error::InconsistentState(format!(
          "trigger document {trigger_id} was not created; registration rolled back"
        )))
      }
      Err(e) => {
        self.rollback_registration(percolation_id, "persistence failed").await?;
        Err(Error::upstream(
          "trigger persistence (reverse-search registration rolled back)",
          e,
        ))
      }
    }
  }

  async fn rollback_registration(
    &self,
    percolation_id: Uuid,
    cause: &str,
  ) -> Result<()> {
    match self.index.deregister_reverse_query(percolation_id).await {
      Ok(_) => Ok(()),
      Err(e) => {
        tracing::error!(
          %percolation_id,
          cause,
          error = %e,
          "rollback of reverse-search registration failed"
        );
        Err(Error::InconsistentState(format!(
          "trigger persistence failed ({cause}) and rollback of \
           registration {percolation_id} also failed: {e}"
        )))
      }
    }
  }

  pub async fn get(&self, id: Uuid) -> Result<Trigger> {
    let doc = self
      .index
      .get(kind::TRIGGER, id)
      .await
      .map_err(|e| Error::upstream("trigger fetch", e))?
      .ok_or(Error::TriggerNotFound(id))?;
    unescape_trigger(doc)
  }

  pub async fn list(&self, page: &Pagination) -> Result<(Vec<Trigger>, u64)> {
    let scanned = self
      .index
      .scan(kind::TRIGGER, page)
      .await
      .map_err(|e| Error::upstream("trigger scan", e))?;

    let triggers = scanned
      .hits
      .into_iter()
      .map(unescape_trigger)
      .collect::<Result<Vec<_>>>()?;

    Ok((triggers, scanned.total))
  }

  /// All triggers referencing `event_type_id`. Supports the blocking
  /// event-type delete; no cascading delete is performed automatically.
  pub async fn list_by_event_type(
    &self,
    event_type_id: Uuid,
  ) -> Result<(Vec<Trigger>, u64)> {
    let mut matched = Vec::new();
    let mut page = Pagination::default();
    loop {
      let scanned = self
        .index
        .scan(kind::TRIGGER, &page)
        .await
        .map_err(|e| Error::upstream("trigger scan", e))?;
      if scanned.hits.is_empty() {
        break;
      }
      for hit in scanned.hits {
        let trigger = unescape_trigger(hit)?;
        if trigger.event_type_id == event_type_id {
          matched.push(trigger);
        }
      }
      page.page += 1;
    }
    let total = matched.len() as u64;
    Ok((matched, total))
  }

  /// `enabled` is the only mutable field. The registered query is untouched.
  pub async fn update(&self, id: Uuid, update: TriggerUpdate) -> Result<Trigger> {
    let mut trigger = self.get(id).await?;
    trigger.enabled = update.enabled;

    let doc = escape_trigger(&trigger)?;
    self
      .index
      .put(kind::TRIGGER, id, doc)
      .await
      .map_err(|e| Error::upstream("trigger update", e))?;

    Ok(trigger)
  }

  /// Delete a trigger and its reverse-search registration.
  ///
  /// The percolation id is only known via the document, so the document is
  /// read first and deleted before the registration: a crash between the two
  /// deletes leaks an orphaned registration rather than losing the ability
  /// to find it. Absent ids are an idempotent no-op, not an error.
  pub async fn delete(&self, id: Uuid) -> Result<bool> {
    let trigger = match self.get(id).await {
      Ok(trigger) => trigger,
      Err(Error::TriggerNotFound(_)) => return Ok(false),
      Err(e) => return Err(e),
    };

    let found = self
      .index
      .delete(kind::TRIGGER, id)
      .await
      .map_err(|e| Error::upstream("trigger deletion", e))?;
    if !found {
      return Ok(false);
    }

    let deregistered = self
      .index
      .deregister_reverse_query(trigger.percolation_id)
      .await
      .map_err(|e| Error::upstream("reverse-search query removal", e))?;
    if !deregistered {
      tracing::error!(
        trigger_id = %id,
        percolation_id = %trigger.percolation_id,
        "trigger document deleted but its registration was already absent"
      );
      return Err(Error::InconsistentState(format!(
        "trigger {id} deleted but registration {} was already absent",
        trigger.percolation_id
      )));
    }

    Ok(true)
  }
}

// ─── Document codec ──────────────────────────────────────────────────────────

fn escape_trigger(trigger: &Trigger) -> Result<Value> {
  let value = serde_json::to_value(trigger)?;
  Ok(Value::from(escape_keys(QueryNode::from(value))))
}

fn unescape_trigger(doc: Value) -> Result<Trigger> {
  let value = Value::from(unescape_keys(QueryNode::from(doc)));
  Ok(serde_json::from_value(value)?)
}
