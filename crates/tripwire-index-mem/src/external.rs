//! Test doubles for the service-registry and job-submission collaborators.

use std::collections::BTreeSet;
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use tripwire_core::external::{JobSubmitter, ServiceRegistry};

#[derive(Debug, Error)]
#[error("service registry unreachable")]
pub struct RegistryUnreachable;

/// A service registry backed by a fixed set of known service ids.
///
/// [`StaticServiceRegistry::unreachable`] simulates a registry that cannot
/// be reached at all, which the trigger store treats as skip-the-check.
pub struct StaticServiceRegistry {
  known: Option<BTreeSet<String>>,
}

impl StaticServiceRegistry {
  pub fn with_services<I, S>(services: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      known: Some(services.into_iter().map(Into::into).collect()),
    }
  }

  pub fn unreachable() -> Self {
    Self { known: None }
  }
}

impl ServiceRegistry for StaticServiceRegistry {
  type Error = RegistryUnreachable;

  async fn exists(&self, service_id: &str) -> Result<bool, Self::Error> {
    match &self.known {
      Some(known) => Ok(known.contains(service_id)),
      None => Err(RegistryUnreachable),
    }
  }
}

#[derive(Debug, Error)]
#[error("job submission refused")]
pub struct SubmitRefused;

/// A job submitter that records every payload and assigns fresh job ids.
#[derive(Default)]
pub struct RecordingJobSubmitter {
  inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
  submitted: Vec<Value>,
  failing:   bool,
}

impl RecordingJobSubmitter {
  pub fn new() -> Self {
    Self::default()
  }

  /// All payloads submitted so far, in order.
  pub fn submitted(&self) -> Vec<Value> {
    self.lock().submitted.clone()
  }

  /// Make every subsequent submission fail until called with `false`.
  pub fn set_failing(&self, failing: bool) {
    self.lock().failing = failing;
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
  }
}

impl JobSubmitter for RecordingJobSubmitter {
  type Error = SubmitRefused;

  async fn submit(&self, payload: Value) -> Result<Uuid, Self::Error> {
    let mut inner = self.lock();
    if inner.failing {
      return Err(SubmitRefused);
    }
    inner.submitted.push(payload);
    Ok(Uuid::new_v4())
  }
}
