//! Sentinel values for set actions
//!
//! A sentinel replaces literal assignment with a named transformation. The
//! set of sentinels is closed and resolved from [`SENTINELS`]; nothing is
//! inferred from the value's shape beyond an exact name match.
//!
//! Two spellings are accepted in an action's `value`:
//! - `"TITLE_CASE"`: a bare string equal to a registered name
//! - `{"sentinel": "TITLE_CASE"}`: explicit form, unknown names are rejected

use crate::calculation::Calculation;
use crate::error::DefinitionError;
use crate::types::{Action, Record};
use crate::value::field_text;
use serde_json::Value;

/// Recognized sentinel transformations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    TitleCase,
    UpperCase,
    LowerCase,
    Trim,
    CurrentDate,
    CurrentTimestamp,
    CalculatedDiscount,
}

/// Sentinel registry: name to transformation
pub const SENTINELS: &[(&str, Sentinel)] = &[
    ("TITLE_CASE", Sentinel::TitleCase),
    ("UPPER_CASE", Sentinel::UpperCase),
    ("LOWER_CASE", Sentinel::LowerCase),
    ("TRIM", Sentinel::Trim),
    ("CURRENT_DATE", Sentinel::CurrentDate),
    ("CURRENT_TIMESTAMP", Sentinel::CurrentTimestamp),
    ("CALCULATED_DISCOUNT", Sentinel::CalculatedDiscount),
];

impl Sentinel {
    pub fn from_name(name: &str) -> Option<Sentinel> {
        SENTINELS
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|(_, sentinel)| *sentinel)
    }

    pub fn name(&self) -> &'static str {
        SENTINELS
            .iter()
            .find(|(_, sentinel)| sentinel == self)
            .map(|(name, _)| *name)
            .unwrap_or("UNKNOWN")
    }

    /// Compute the value written to `field`
    ///
    /// Text transformations leave a null or absent field untouched.
    pub fn apply(&self, field: &str, record: &Record) -> Value {
        let current = record.get(field);
        let text = field_text(current);

        match self {
            Sentinel::TitleCase => text.map_or(Value::Null, |t| Value::String(title_case(&t))),
            Sentinel::UpperCase => text.map_or(Value::Null, |t| Value::String(t.to_uppercase())),
            Sentinel::LowerCase => text.map_or(Value::Null, |t| Value::String(t.to_lowercase())),
            Sentinel::Trim => text.map_or(Value::Null, |t| Value::String(t.trim().to_string())),
            Sentinel::CurrentDate => {
                Value::String(chrono::Utc::now().format("%Y-%m-%d").to_string())
            },
            Sentinel::CurrentTimestamp => Value::String(chrono::Utc::now().to_rfc3339()),
            Sentinel::CalculatedDiscount => Calculation::default_discount()
                .compute(record)
                .unwrap_or(Value::Null),
        }
    }
}

/// Where a set action's value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    Literal(Value),
    Sentinel(Sentinel),
}

/// Resolve a set action's value against the sentinel registry
pub fn resolve_value(action: &Action) -> Result<Option<ValueSource>, DefinitionError> {
    let Some(value) = &action.value else {
        return Ok(None);
    };

    match value {
        Value::String(s) => Ok(Some(
            Sentinel::from_name(s)
                .map(ValueSource::Sentinel)
                .unwrap_or_else(|| ValueSource::Literal(value.clone())),
        )),
        Value::Object(map) if map.len() == 1 && map.contains_key("sentinel") => {
            let name = map
                .get("sentinel")
                .and_then(Value::as_str)
                .unwrap_or_default();
            Sentinel::from_name(name)
                .map(|s| Some(ValueSource::Sentinel(s)))
                .ok_or_else(|| DefinitionError::UnknownSentinel {
                    action_id: action.id.to_string(),
                    name: name.to_string(),
                })
        },
        other => Ok(Some(ValueSource::Literal(other.clone()))),
    }
}

/// Capitalize the first letter of each whitespace-separated word
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}
