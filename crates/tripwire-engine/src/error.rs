//! Error type for `tripwire-engine`.
//!
//! Upstream failures (store, registry, job submission) are wrapped with the
//! name of the sub-step that failed; they are returned, never retried here.
//! `InconsistentState` marks the traces of a prior partial failure: a delete
//! or rollback step found a registration or document it expected absent, or
//! vice versa.

use thiserror::Error;
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("event type not found: {0}")]
  EventTypeNotFound(Uuid),

  #[error("event type name {0:?} already in use")]
  DuplicateName(String),

  #[error("event type {0} still has {1} dependent trigger(s)")]
  HasDependents(Uuid, u64),

  #[error("trigger not found: {0}")]
  TriggerNotFound(Uuid),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("event references unknown event type: {0}")]
  UnknownEventType(Uuid),

  #[error("alert not found: {0}")]
  AlertNotFound(Uuid),

  #[error("service {0:?} is not registered")]
  UnknownService(String),

  #[error(transparent)]
  Core(#[from] tripwire_core::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("{op} failed: {source}")]
  Upstream {
    op:     &'static str,
    #[source]
    source: BoxError,
  },

  #[error("inconsistent state: {0}")]
  InconsistentState(String),
}

impl Error {
  /// Wrap a collaborator failure with the sub-step that hit it.
  pub fn upstream<E>(op: &'static str, source: E) -> Self
  where
    E: Into<BoxError>,
  {
    Self::Upstream { op, source: source.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
