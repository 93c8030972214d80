//! Event types — named schemas for incoming facts.
//!
//! An event type declares the fields an event of that type carries and their
//! value kinds. It is immutable after creation; there is no update operation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

/// Field names every event may carry without declaring them in its mapping.
///
/// These are caller-supplied correlation fields (e.g. the submitting user's
/// identity key). They are excluded from the namespace field set so that
/// cross-cutting conditions ("same caller") remain expressible across event
/// types.
pub const RESERVED_FIELDS: &[&str] = &["userName", "jobId"];

// ─── Field kinds ─────────────────────────────────────────────────────────────

/// The value kind of a declared event field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
  String,
  Integer,
  Long,
  Double,
  Boolean,
  Date,
}

impl FieldKind {
  /// Whether a JSON scalar is acceptable for this kind.
  pub fn admits(&self, value: &Value) -> bool {
    match self {
      Self::String | Self::Date => value.is_string(),
      Self::Integer | Self::Long => value.is_i64() || value.is_u64(),
      Self::Double => value.is_number(),
      Self::Boolean => value.is_boolean(),
    }
  }
}

/// Field name → value kind.
pub type Mapping = BTreeMap<String, FieldKind>;

// ─── EventType ───────────────────────────────────────────────────────────────

/// A named schema for events. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
  pub event_type_id: Uuid,
  pub name:          String,
  pub created_on:    DateTime<Utc>,
  pub mapping:       Mapping,
}

impl EventType {
  /// The declared field names that participate in condition namespacing.
  ///
  /// Reserved correlation fields are excluded: conditions on them must match
  /// events of any type, so their keys pass through unqualified.
  pub fn namespace_fields(&self) -> BTreeSet<&str> {
    self
      .mapping
      .keys()
      .map(String::as_str)
      .filter(|f| !RESERVED_FIELDS.contains(f))
      .collect()
  }

  /// Validate submitted event data against this type's mapping.
  ///
  /// Every field must be declared or reserved. Reserved correlation fields
  /// must be strings; an object value there would be indistinguishable from
  /// the type-namespace wrapper in the stored document. Declared values must
  /// agree with their kind.
  pub fn validate_data(&self, data: &BTreeMap<String, Value>) -> Result<()> {
    for (field, value) in data {
      if RESERVED_FIELDS.contains(&field.as_str()) {
        if !value.is_string() {
          return Err(Error::InvalidEventData(format!(
            "reserved field {field:?} must be a string"
          )));
        }
        continue;
      }
      match self.mapping.get(field) {
        None => {
          return Err(Error::InvalidEventData(format!(
            "field {field:?} is not declared by event type {:?}",
            self.name
          )));
        }
        Some(kind) if !kind.admits(value) => {
          return Err(Error::InvalidEventData(format!(
            "field {field:?} does not match its declared kind {kind:?}"
          )));
        }
        Some(_) => {}
      }
    }
    Ok(())
  }
}

// ─── NewEventType ────────────────────────────────────────────────────────────

/// Input to event type registration. `created_on` is set by the registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEventType {
  pub name:    String,
  pub mapping: Mapping,
}

impl NewEventType {
  /// Structural validation of the mapping, independent of uniqueness.
  ///
  /// Field names must be non-empty, must not contain `.` or `~` (both are
  /// meaningful to the stored-key escaping and path namespacing), and must
  /// not shadow a reserved correlation field.
  pub fn validate(&self) -> Result<()> {
    if self.name.is_empty() {
      return Err(Error::InvalidMapping("event type name is empty".into()));
    }
    if self.mapping.is_empty() {
      return Err(Error::InvalidMapping("mapping declares no fields".into()));
    }
    for field in self.mapping.keys() {
      if field.is_empty() {
        return Err(Error::InvalidMapping("empty field name".into()));
      }
      if field.contains('.') || field.contains('~') {
        return Err(Error::InvalidMapping(format!(
          "field name {field:?} contains a reserved character"
        )));
      }
      if RESERVED_FIELDS.contains(&field.as_str()) {
        return Err(Error::InvalidMapping(format!(
          "field name {field:?} shadows a reserved correlation field"
        )));
      }
    }
    Ok(())
  }
}
