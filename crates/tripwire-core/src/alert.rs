//! Alerts — the record of one trigger firing against one event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Created only as a byproduct of a successful match-and-submit; never
/// updated, deleted explicitly by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
  pub alert_id:   Uuid,
  pub trigger_id: Uuid,
  pub event_id:   Uuid,
  pub job_id:     Uuid,
  pub created_on: DateTime<Utc>,
}
