//! Boundary traits for the external job-execution and service-registry
//! systems invoked as a result of a match.

use std::future::Future;

use serde_json::Value;
use uuid::Uuid;

/// Advisory lookup of action target services.
///
/// The trigger store treats `Ok(false)` as a validation failure but a
/// transport error as "registry unreachable" and skips the check entirely
/// (test/offline mode).
pub trait ServiceRegistry: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn exists<'a>(
    &'a self,
    service_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

/// Submission of rendered job requests to the external executor.
///
/// Only submission is in scope; execution, polling, and results belong to
/// the collaborator. Failures are surfaced verbatim and never retried here.
pub trait JobSubmitter: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn submit(
    &self,
    payload: Value,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + '_;
}
