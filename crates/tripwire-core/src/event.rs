//! Events — immutable fact instances conforming to an event type.
//!
//! An event is validated against its type's mapping when posted, matched
//! against registered trigger conditions exactly once, and never mutated.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An immutable fact instance. Matching happens synchronously at creation;
/// triggers registered afterwards never see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub event_id:      Uuid,
  pub event_type_id: Uuid,
  pub created_on:    DateTime<Utc>,
  pub data:          BTreeMap<String, Value>,
}

/// Input to event submission. `created_on` defaults to the ingest time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
  pub event_type_id: Uuid,
  pub created_on:    Option<DateTime<Utc>>,
  pub data:          BTreeMap<String, Value>,
}
