//! Value coercion helpers
//!
//! Record values arrive as JSON variants whose storage type is not reliable
//! (numbers stored as strings and vice versa). Comparisons go through these
//! helpers so that `750` and `"750"` compare equal.

use serde_json::Value;
use std::borrow::Cow;

/// Largest magnitude rendered as an integer when a float has no fraction
const INTEGRAL_RENDER_LIMIT: f64 = 1e15;

/// String form of a value; `None` for null
pub fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Number(n) => Some(Cow::Owned(number_text(n))),
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// String form of an optional (possibly absent) field value
pub fn field_text(value: Option<&Value>) -> Option<Cow<'_, str>> {
    value.and_then(as_text)
}

fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < INTEGRAL_RENDER_LIMIT => {
            format!("{}", f as i64)
        },
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Numeric form of a value; `None` when it does not parse as a finite number
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        },
        _ => None,
    }
}

/// Null, absent, or empty string
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// JSON value for a computed float, integral when possible
pub fn number_value(f: f64) -> Value {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < INTEGRAL_RENDER_LIMIT {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
