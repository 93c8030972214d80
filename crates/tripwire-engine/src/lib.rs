//! The Tripwire engine: trigger lifecycle, query rewriting, and the
//! event→match→alert→job pipeline.
//!
//! Everything here is generic over the three boundary traits in
//! [`tripwire_core`]: the indexed document store (with its reverse-search
//! primitive), the advisory service registry, and the job submitter. The
//! engine holds no mutable state of its own — all coordination is delegated
//! to the store's per-document atomicity, and every read re-fetches.

pub mod alerts;
pub mod error;
pub mod event_types;
pub mod events;
pub mod template;
pub mod triggers;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use uuid::Uuid;

use tripwire_core::{
  external::{JobSubmitter, ServiceRegistry},
  index::DocumentIndex,
};

pub use alerts::AlertEmitter;
pub use error::{Error, Result};
pub use event_types::EventTypeRegistry;
pub use events::EventIngestor;
pub use triggers::TriggerStore;

/// Document kinds in the shared index.
pub mod kind {
  pub const EVENT_TYPE: &str = "eventType";
  pub const EVENT: &str = "event";
  pub const TRIGGER: &str = "trigger";
  pub const ALERT: &str = "alert";
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// The assembled engine: one component per resource, sharing the same
/// collaborators. Cloning is cheap.
pub struct Workflow<I, R, J> {
  pub event_types: EventTypeRegistry<I>,
  pub triggers:    TriggerStore<I, R>,
  pub events:      EventIngestor<I, R, J>,
  pub alerts:      AlertEmitter<I, R, J>,
}

impl<I, R, J> Clone for Workflow<I, R, J> {
  fn clone(&self) -> Self {
    Self {
      event_types: self.event_types.clone(),
      triggers:    self.triggers.clone(),
      events:      self.events.clone(),
      alerts:      self.alerts.clone(),
    }
  }
}

impl<I, R, J> Workflow<I, R, J>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  pub fn new(index: Arc<I>, services: Arc<R>, jobs: Arc<J>) -> Self {
    let event_types = EventTypeRegistry::new(Arc::clone(&index));
    let triggers = TriggerStore::new(
      Arc::clone(&index),
      Arc::clone(&services),
      event_types.clone(),
    );
    let alerts = AlertEmitter::new(Arc::clone(&index), triggers.clone(), jobs);
    let events =
      EventIngestor::new(index, event_types.clone(), alerts.clone());

    Self { event_types, triggers, events, alerts }
  }

  /// Delete an event type, blocking if live triggers still reference it.
  ///
  /// No cascading delete: callers must remove dependent triggers first.
  /// Returns `false` for an absent id.
  pub async fn delete_event_type(&self, id: Uuid) -> Result<bool> {
    let (_, dependents) = self.triggers.list_by_event_type(id).await?;
    if dependents > 0 {
      return Err(Error::HasDependents(id, dependents));
    }
    self.event_types.delete(id).await
  }
}
