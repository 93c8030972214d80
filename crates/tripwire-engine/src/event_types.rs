//! [`EventTypeRegistry`] — owns event-type schemas and the namespace
//! derivation used when compiling trigger conditions.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tripwire_core::{
  event_type::{EventType, NewEventType},
  index::{DocumentIndex, Pagination},
};

use crate::{Error, Result, kind};

pub struct EventTypeRegistry<I> {
  index: Arc<I>,
}

impl<I> Clone for EventTypeRegistry<I> {
  fn clone(&self) -> Self {
    Self { index: Arc::clone(&self.index) }
  }
}

impl<I> EventTypeRegistry<I>
where
  I: DocumentIndex,
{
  pub fn new(index: Arc<I>) -> Self {
    Self { index }
  }

  /// Register a new event type. The name must be unique; the mapping must
  /// pass structural validation.
  pub async fn register(&self, input: NewEventType) -> Result<EventType> {
    input.validate()?;

    if self.get_by_name(&input.name).await?.is_some() {
      return Err(Error::DuplicateName(input.name));
    }

    let event_type = EventType {
      event_type_id: Uuid::new_v4(),
      name:          input.name,
      created_on:    Utc::now(),
      mapping:       input.mapping,
    };

    let doc = serde_json::to_value(&event_type)?;
    let outcome = self
      .index
      .post(kind::EVENT_TYPE, event_type.event_type_id, doc)
      .await
      .map_err(|e| Error::upstream("event type persistence", e))?;
    if !outcome.created {
      return Err(Error::InconsistentState(format!(
        "event type document {} was not created",
        event_type.event_type_id
      )));
    }

    Ok(event_type)
  }

  pub async fn get(&self, id: Uuid) -> Result<EventType> {
    let doc = self
      .index
      .get(kind::EVENT_TYPE, id)
      .await
      .map_err(|e| Error::upstream("event type fetch", e))?
      .ok_or(Error::EventTypeNotFound(id))?;
    Ok(serde_json::from_value(doc)?)
  }

  /// Convenience read; not authoritative for uniqueness. A race between
  /// concurrent registrations is resolved by the store's per-id atomicity,
  /// not by this scan.
  pub async fn get_by_name(&self, name: &str) -> Result<Option<EventType>> {
    let mut page = Pagination::default();
    loop {
      let scanned = self
        .index
        .scan(kind::EVENT_TYPE, &page)
        .await
        .map_err(|e| Error::upstream("event type scan", e))?;
      if scanned.hits.is_empty() {
        return Ok(None);
      }
      for hit in scanned.hits {
        let event_type: EventType = serde_json::from_value(hit)?;
        if event_type.name == name {
          return Ok(Some(event_type));
        }
      }
      page.page += 1;
    }
  }

  pub async fn list(&self, page: &Pagination) -> Result<(Vec<EventType>, u64)> {
    let scanned = self
      .index
      .scan(kind::EVENT_TYPE, page)
      .await
      .map_err(|e| Error::upstream("event type scan", e))?;

    let event_types = scanned
      .hits
      .into_iter()
      .map(serde_json::from_value::<EventType>)
      .collect::<Result<Vec<_>, _>>()?;

    Ok((event_types, scanned.total))
  }

  /// Raw document delete; the dependent-trigger policy lives on
  /// [`Workflow::delete_event_type`](crate::Workflow::delete_event_type).
  pub async fn delete(&self, id: Uuid) -> Result<bool> {
    self
      .index
      .delete(kind::EVENT_TYPE, id)
      .await
      .map_err(|e| Error::upstream("event type deletion", e))
  }
}
