//! Condition query trees and the structural rewrites applied to them.
//!
//! Trigger conditions are user-authored nested structures. Two rewrites make
//! them safe to store and match:
//!
//! - **Key escaping**: the persisted trigger document's storage schema treats
//!   `.` in a key as a nested-path separator, which would corrupt a condition
//!   whose field names are intentionally dotted (e.g. `data.alpha`). Every
//!   literal `.` in a map key is stored as `~` and restored on read.
//! - **Namespacing**: all event types share one reverse-search space, so a
//!   condition's field references are qualified with the owning event type's
//!   name before registration. Two types both declaring `status` can then
//!   coexist without spurious cross-type matches.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node in a condition or query tree.
///
/// `BTreeMap` keeps serialization deterministic; callers assert on key
/// presence, never on order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryNode {
  Object(BTreeMap<String, QueryNode>),
  Sequence(Vec<QueryNode>),
  Scalar(Value),
}

impl From<Value> for QueryNode {
  fn from(value: Value) -> Self {
    match value {
      Value::Object(map) => QueryNode::Object(
        map.into_iter().map(|(k, v)| (k, QueryNode::from(v))).collect(),
      ),
      Value::Array(items) => {
        QueryNode::Sequence(items.into_iter().map(QueryNode::from).collect())
      }
      scalar => QueryNode::Scalar(scalar),
    }
  }
}

impl From<QueryNode> for Value {
  fn from(node: QueryNode) -> Self {
    match node {
      QueryNode::Object(map) => Value::Object(
        map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
      ),
      QueryNode::Sequence(items) => {
        Value::Array(items.into_iter().map(Value::from).collect())
      }
      QueryNode::Scalar(scalar) => scalar,
    }
  }
}

// ─── Key escaping ────────────────────────────────────────────────────────────

/// Replace every literal `.` in a map key with `~`, recursively.
/// Applied to the full trigger value before persistence.
pub fn escape_keys(node: QueryNode) -> QueryNode {
  rewrite_keys(node, &|key| key.replace('.', "~"))
}

/// The exact inverse of [`escape_keys`], applied when a trigger is read back.
///
/// Keys that themselves contain a literal `~` are not losslessly reversible;
/// that is a documented limitation, not defended against.
pub fn unescape_keys(node: QueryNode) -> QueryNode {
  rewrite_keys(node, &|key| key.replace('~', "."))
}

fn rewrite_keys(node: QueryNode, f: &dyn Fn(&str) -> String) -> QueryNode {
  match node {
    QueryNode::Object(map) => QueryNode::Object(
      map
        .into_iter()
        .map(|(k, v)| (f(&k), rewrite_keys(v, f)))
        .collect(),
    ),
    QueryNode::Sequence(items) => QueryNode::Sequence(
      items.into_iter().map(|v| rewrite_keys(v, f)).collect(),
    ),
    scalar => scalar,
  }
}

// ─── Namespacing ─────────────────────────────────────────────────────────────

/// Qualify a condition's field references with the owning event type's name.
///
/// Every map key of the exact form `data.<field>` with `<field>` in
/// `fields` becomes `data.<event_type_name>.<field>`; all other keys pass
/// through unchanged. Applied once, at trigger-condition compile time,
/// before registration.
pub fn namespace_keys(
  node: QueryNode,
  event_type_name: &str,
  fields: &BTreeSet<&str>,
) -> QueryNode {
  match node {
    QueryNode::Object(map) => QueryNode::Object(
      map
        .into_iter()
        .map(|(k, v)| {
          let key = namespace_key(k, event_type_name, fields);
          (key, namespace_keys(v, event_type_name, fields))
        })
        .collect(),
    ),
    QueryNode::Sequence(items) => QueryNode::Sequence(
      items
        .into_iter()
        .map(|v| namespace_keys(v, event_type_name, fields))
        .collect(),
    ),
    scalar => scalar,
  }
}

fn namespace_key(
  key: String,
  event_type_name: &str,
  fields: &BTreeSet<&str>,
) -> String {
  match key.strip_prefix("data.") {
    Some(field) if fields.contains(field) => {
      format!("data.{event_type_name}.{field}")
    }
    _ => key,
  }
}
