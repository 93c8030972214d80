//! [`EventIngestor`] — validates incoming events, writes them to the index
//! in namespaced document form, and fans matched triggers out to the alert
//! emitter.
//!
//! Matching happens exactly once, inside the index post that stores the
//! document. There is no re-evaluation of past events when triggers change.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use tripwire_core::{
  alert::Alert,
  event::{Event, NewEvent},
  event_type::{EventType, RESERVED_FIELDS},
  external::{JobSubmitter, ServiceRegistry},
  index::{DocumentIndex, Pagination},
};

use crate::{
  Error, Result, alerts::AlertEmitter, event_types::EventTypeRegistry, kind,
};

pub struct EventIngestor<I, R, J> {
  index:       Arc<I>,
  event_types: EventTypeRegistry<I>,
  alerts:      AlertEmitter<I, R, J>,
}

impl<I, R, J> Clone for EventIngestor<I, R, J> {
  fn clone(&self) -> Self {
    Self {
      index:       Arc::clone(&self.index),
      event_types: self.event_types.clone(),
      alerts:      self.alerts.clone(),
    }
  }
}

impl<I, R, J> EventIngestor<I, R, J>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  pub fn new(
    index: Arc<I>,
    event_types: EventTypeRegistry<I>,
    alerts: AlertEmitter<I, R, J>,
  ) -> Self {
    Self { index, event_types, alerts }
  }

  /// Ingest an event: validate it against its type, store it, and emit an
  /// alert for every trigger whose registered condition the document
  /// matched.
  ///
  /// A per-trigger emit failure is logged and skipped; the event itself is
  /// already stored and the post succeeds.
  pub async fn post(&self, input: NewEvent) -> Result<(Event, Vec<Alert>)> {
    let event_type = match self.event_types.get(input.event_type_id).await {
      Ok(event_type) => event_type,
      Err(Error::EventTypeNotFound(id)) => {
        return Err(Error::UnknownEventType(id));
      }
      Err(e) => return Err(e),
    };

    event_type.validate_data(&input.data)?;

    let event = Event {
      event_id:      Uuid::new_v4(),
      event_type_id: input.event_type_id,
      created_on:    input.created_on.unwrap_or_else(Utc::now),
      data:          input.data,
    };

    let doc = to_index_document(&event, &event_type)?;
    let outcome = self
      .index
      .post(kind::EVENT, event.event_id, doc)
      .await
      .map_err(|e| Error::upstream("event persistence", e))?;
    if !outcome.created {
      return Err(Error::InconsistentState(format!(
        "event document {} was not created",
        event.event_id
      )));
    }

    let mut alerts = Vec::new();
    for trigger_id in outcome.matched_queries {
      match self.alerts.emit(trigger_id, &event).await {
        Ok(Some(alert)) => alerts.push(alert),
        Ok(None) => {}
        Err(e) => tracing::warn!(
          %trigger_id,
          event_id = %event.event_id,
          error = %e,
          "alert emission failed; continuing with remaining matches"
        ),
      }
    }

    Ok((event, alerts))
  }

  pub async fn get(&self, id: Uuid) -> Result<Event> {
    let doc = self
      .index
      .get(kind::EVENT, id)
      .await
      .map_err(|e| Error::upstream("event fetch", e))?
      .ok_or(Error::EventNotFound(id))?;
    from_index_document(doc)
  }

  pub async fn list(&self, page: &Pagination) -> Result<(Vec<Event>, u64)> {
    let scanned = self
      .index
      .scan(kind::EVENT, page)
      .await
      .map_err(|e| Error::upstream("event scan", e))?;

    let events = scanned
      .hits
      .into_iter()
      .map(from_index_document)
      .collect::<Result<Vec<_>>>()?;

    Ok((events, scanned.total))
  }

  /// Idempotent; returns `false` for an absent id. Alerts referencing the
  /// event are kept as historical records.
  pub async fn delete(&self, id: Uuid) -> Result<bool> {
    self
      .index
      .delete(kind::EVENT, id)
      .await
      .map_err(|e| Error::upstream("event deletion", e))
  }
}

// ─── Document codec ──────────────────────────────────────────────────────────

/// Nest declared fields under the event type's name so they land at
/// `data.<type>.<field>`, the paths registered conditions are written
/// against. Reserved correlation fields stay at `data.<field>`, shared
/// across all types.
fn to_index_document(event: &Event, event_type: &EventType) -> Result<Value> {
  let mut doc = serde_json::to_value(event)?;

  let mut flat = Map::new();
  let mut namespaced = Map::new();
  for (field, value) in &event.data {
    if RESERVED_FIELDS.contains(&field.as_str()) {
      flat.insert(field.clone(), value.clone());
    } else {
      namespaced.insert(field.clone(), value.clone());
    }
  }
  if !namespaced.is_empty() {
    flat.insert(event_type.name.clone(), Value::Object(namespaced));
  }

  doc["data"] = Value::Object(flat);
  Ok(doc)
}

/// Inverse of [`to_index_document`]. Declared field kinds and reserved
/// fields are all scalar (enforced by `validate_data`), so an object value
/// under `data` can only be the type namespace.
fn from_index_document(mut doc: Value) -> Result<Event> {
  if let Some(Value::Object(data)) = doc.get_mut("data").map(Value::take) {
    let mut flat = Map::new();
    for (key, value) in data {
      match value {
        Value::Object(inner) => flat.extend(inner),
        scalar => {
          flat.insert(key, scalar);
        }
      }
    }
    doc["data"] = Value::Object(flat);
  }
  Ok(serde_json::from_value(doc)?)
}
