//! Reverse-search query evaluation over flattened documents.
//!
//! Supports the query shapes the engine actually registers: a top-level
//! `{"query": …}` wrapper around `match_all`, `match`, `term`, `range`, and
//! `bool` clauses. Field references are dotted paths into the document.

use serde_json::Value;

use crate::{Error, Result};

// ─── Validation ──────────────────────────────────────────────────────────────

/// Check that `body` only uses supported clauses. Called at registration so
/// a malformed condition is rejected before the trigger is persisted, the
/// same way the real store rejects an unparseable query.
pub fn validate(body: &Value) -> Result<()> {
  validate_clause(unwrap_query(body))
}

fn unwrap_query(body: &Value) -> &Value {
  body.get("query").unwrap_or(body)
}

fn validate_clause(clause: &Value) -> Result<()> {
  let Some(obj) = clause.as_object() else {
    return Err(Error::UnsupportedQuery("clause is not an object".into()));
  };
  // A clause object carries exactly one clause; evaluation only looks at
  // one key, so anything else must be rejected up front.
  let (name, args) = match obj.iter().next() {
    Some(entry) if obj.len() == 1 => entry,
    Some(_) => {
      return Err(Error::UnsupportedQuery(
        "clause object holds more than one clause".into(),
      ));
    }
    None => return Err(Error::UnsupportedQuery("empty clause".into())),
  };
  match name.as_str() {
    "match_all" => Ok(()),
    "match" | "term" => {
      let valid = args
        .as_object()
        .is_some_and(|m| m.len() == 1 && m.values().all(|v| !v.is_object()));
      if valid {
        Ok(())
      } else {
        Err(Error::UnsupportedQuery(format!(
          "{name} expects a single field with a scalar value"
        )))
      }
    }
    "range" => {
      let valid = args.as_object().is_some_and(|m| {
        m.len() == 1
          && m.values().all(|bounds| {
            bounds.as_object().is_some_and(|b| {
              !b.is_empty()
                && b.iter().all(|(op, v)| {
                  matches!(op.as_str(), "gt" | "gte" | "lt" | "lte")
                    && v.is_number()
                })
            })
          })
      });
      if valid {
        Ok(())
      } else {
        Err(Error::UnsupportedQuery(
          "range expects a single field with numeric bounds".into(),
        ))
      }
    }
    "bool" => {
      let Some(parts) = args.as_object() else {
        return Err(Error::UnsupportedQuery("bool expects an object".into()));
      };
      for (part, clauses) in parts {
        if !matches!(part.as_str(), "must" | "must_not" | "should" | "filter") {
          return Err(Error::UnsupportedQuery(format!(
            "unknown bool part {part:?}"
          )));
        }
        for sub in as_clause_list(clauses) {
          validate_clause(sub)?;
        }
      }
      Ok(())
    }
    other => Err(Error::UnsupportedQuery(format!("unknown clause {other:?}"))),
  }
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

/// Whether `doc` satisfies the registered query `body`.
/// Assumes `body` passed [`validate`].
pub fn matches(body: &Value, doc: &Value) -> bool {
  let mut paths = Vec::new();
  flatten(doc, String::new(), &mut paths);
  eval_clause(unwrap_query(body), &paths)
}

fn eval_clause(clause: &Value, paths: &[(String, Value)]) -> bool {
  let Some(obj) = clause.as_object() else {
    return false;
  };
  let Some((name, args)) = obj.iter().next() else {
    return false;
  };
  match name.as_str() {
    "match_all" => true,
    "match" | "term" => {
      let Some((field, expected)) =
        args.as_object().and_then(|m| m.iter().next())
      else {
        return false;
      };
      paths
        .iter()
        .any(|(path, actual)| path == field && scalar_eq(actual, expected))
    }
    "range" => {
      let Some((field, bounds)) =
        args.as_object().and_then(|m| m.iter().next())
      else {
        return false;
      };
      paths.iter().any(|(path, actual)| {
        path == field && in_range(actual, bounds)
      })
    }
    "bool" => {
      let part = |name: &str| args.get(name).map(as_clause_list);

      if let Some(must) = part("must")
        && !must.iter().all(|c| eval_clause(c, paths))
      {
        return false;
      }
      if let Some(filter) = part("filter")
        && !filter.iter().all(|c| eval_clause(c, paths))
      {
        return false;
      }
      if let Some(must_not) = part("must_not")
        && must_not.iter().any(|c| eval_clause(c, paths))
      {
        return false;
      }
      // `should` is only decisive when it is the sole positive part.
      if args.get("must").is_none()
        && args.get("filter").is_none()
        && let Some(should) = part("should")
      {
        return should.iter().any(|c| eval_clause(c, paths));
      }
      true
    }
    _ => false,
  }
}

fn as_clause_list(clauses: &Value) -> Vec<&Value> {
  match clauses {
    Value::Array(items) => items.iter().collect(),
    single => vec![single],
  }
}

fn scalar_eq(actual: &Value, expected: &Value) -> bool {
  if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
    return a == b;
  }
  actual == expected
}

fn in_range(actual: &Value, bounds: &Value) -> bool {
  let Some(n) = actual.as_f64() else {
    return false;
  };
  let Some(bounds) = bounds.as_object() else {
    return false;
  };
  bounds.iter().all(|(op, limit)| {
    let Some(limit) = limit.as_f64() else {
      return false;
    };
    match op.as_str() {
      "gt" => n > limit,
      "gte" => n >= limit,
      "lt" => n < limit,
      "lte" => n <= limit,
      _ => false,
    }
  })
}

/// Flatten a document into dotted-path/scalar pairs. Array elements are
/// recorded at their parent's path, so a query matches if any element does.
fn flatten(value: &Value, prefix: String, out: &mut Vec<(String, Value)>) {
  match value {
    Value::Object(map) => {
      for (key, v) in map {
        let path = if prefix.is_empty() {
          key.clone()
        } else {
          format!("{prefix}.{key}")
        };
        flatten(v, path, out);
      }
    }
    Value::Array(items) => {
      for v in items {
        flatten(v, prefix.clone(), out);
      }
    }
    scalar => out.push((prefix, scalar.clone())),
  }
}
