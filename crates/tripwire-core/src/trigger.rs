//! Triggers — standing conditions paired with job action templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result, query::QueryNode};

// ─── Job action template ─────────────────────────────────────────────────────

/// The typed half of a job request: what to execute and with what inputs.
/// String values in `data` may contain `$<field>` tokens, substituted from
/// the matching event's data when the trigger fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobType {
  #[serde(rename = "type")]
  pub kind: String,
  pub data: Map<String, Value>,
}

/// The job request template submitted (after rendering) when a trigger fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
  pub created_by: Option<String>,
  pub job_type:   JobType,
}

impl JobRequest {
  /// The identifier of the action's target service.
  ///
  /// Required to be a JSON string under `jobType.data.serviceId`; used for
  /// the best-effort existence probe at trigger creation.
  pub fn service_id(&self) -> Result<&str> {
    self
      .job_type
      .data
      .get("serviceId")
      .and_then(Value::as_str)
      .ok_or(Error::MissingServiceId)
  }
}

// ─── Trigger ─────────────────────────────────────────────────────────────────

/// A standing condition over one event type's fields, paired with a job
/// template. `percolation_id` is the identifier the store assigned when the
/// condition was registered as a reverse-search query; it lives and dies
/// with the trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
  pub trigger_id:     Uuid,
  pub name:           String,
  pub enabled:        bool,
  pub event_type_id:  Uuid,
  pub condition:      QueryNode,
  pub job:            JobRequest,
  pub percolation_id: Uuid,
  pub created_on:     DateTime<Utc>,
}

/// Input to trigger creation. The condition is user-authored and bare; the
/// store namespaces it and wraps it for registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrigger {
  pub name:          String,
  #[serde(default = "enabled_default")]
  pub enabled:       bool,
  pub event_type_id: Uuid,
  pub condition:     QueryNode,
  pub job:           JobRequest,
}

fn enabled_default() -> bool {
  true
}

/// The only mutable part of a persisted trigger.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TriggerUpdate {
  pub enabled: bool,
}
