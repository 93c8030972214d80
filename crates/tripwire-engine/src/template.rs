//! Job-template rendering: `$<field>` substitution from event data.
//!
//! A trigger's job template is a JSON tree whose string leaves may reference
//! event fields. Rendering rules:
//!
//! - A string that is exactly one `$field` token becomes the event value
//!   verbatim, preserving its kind.
//! - Otherwise every embedded `$field` token is substituted textually:
//!   strings verbatim, other scalars in their JSON form. If at least one
//!   substitution happened and the result parses as a JSON object or array,
//!   the parsed value is inlined — this is how an embedded-JSON template
//!   like `{"count": $beta}` renders `count` as a number.
//! - Unknown tokens are left untouched.

use std::collections::BTreeMap;

use serde_json::Value;

/// Render a job template against an event's data.
pub fn render(template: Value, data: &BTreeMap<String, Value>) -> Value {
  match template {
    Value::Object(map) => Value::Object(
      map.into_iter().map(|(k, v)| (k, render(v, data))).collect(),
    ),
    Value::Array(items) => {
      Value::Array(items.into_iter().map(|v| render(v, data)).collect())
    }
    Value::String(s) => render_string(&s, data),
    scalar => scalar,
  }
}

fn render_string(s: &str, data: &BTreeMap<String, Value>) -> Value {
  // Whole-string token: the event value replaces the node, kind preserved.
  if let Some(field) = s.strip_prefix('$')
    && is_field_name(field)
    && let Some(value) = data.get(field)
  {
    return value.clone();
  }

  let (out, substituted) = substitute_tokens(s, data);
  if !substituted {
    return Value::String(out);
  }

  // Embedded-JSON templates carry their tokens in structural positions;
  // inline the parsed value so non-string kinds survive.
  match serde_json::from_str::<Value>(&out) {
    Ok(parsed @ (Value::Object(_) | Value::Array(_))) => parsed,
    _ => Value::String(out),
  }
}

fn substitute_tokens(s: &str, data: &BTreeMap<String, Value>) -> (String, bool) {
  let mut out = String::with_capacity(s.len());
  let mut rest = s;
  let mut substituted = false;

  while let Some(pos) = rest.find('$') {
    out.push_str(&rest[..pos]);
    rest = &rest[pos + 1..];

    let end = rest
      .char_indices()
      .find(|(i, c)| !is_field_char(*c, *i == 0))
      .map(|(i, _)| i)
      .unwrap_or(rest.len());

    let field = &rest[..end];
    match data.get(field) {
      Some(Value::String(text)) => {
        out.push_str(text);
        substituted = true;
      }
      Some(value) => {
        out.push_str(&value.to_string());
        substituted = true;
      }
      None => {
        out.push('$');
        out.push_str(field);
      }
    }
    rest = &rest[end..];
  }

  out.push_str(rest);
  (out, substituted)
}

fn is_field_name(s: &str) -> bool {
  !s.is_empty()
    && s
      .char_indices()
      .all(|(i, c)| is_field_char(c, i == 0))
}

fn is_field_char(c: char, first: bool) -> bool {
  c == '_' || c.is_ascii_alphabetic() || (!first && c.is_ascii_digit())
}
