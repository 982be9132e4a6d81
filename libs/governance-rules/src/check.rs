//! Regex and check-table validators
//!
//! - Regex mode: one pattern against one named field, pass/fail only
//! - Check-table mode: linear scan, the first holding row supplies the result

use crate::action::ValidationFailure;
use crate::condition::ConditionEvaluator;
use crate::error::DefinitionError;
use crate::types::{CheckRow, ItemId, Record};
use serde_json::Value;

/// Failure message used when a rule does not provide one
pub const DEFAULT_PATTERN_MESSAGE: &str = "Value does not match the required pattern";

/// Outcome of a check-table lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CheckMatch {
    pub row_id: ItemId,
    pub result: Value,
}

/// Validate `record[field]` against `pattern`
///
/// An absent or null value does not match. An invalid pattern is a
/// definition error.
pub fn validate_pattern(
    evaluator: &ConditionEvaluator,
    field: &str,
    pattern: &str,
    message: Option<&str>,
    record: &Record,
) -> Result<Option<ValidationFailure>, DefinitionError> {
    if evaluator.matches_pattern(field, pattern, record)? {
        return Ok(None);
    }
    Ok(Some(ValidationFailure {
        field: field.to_string(),
        message: message.unwrap_or(DEFAULT_PATTERN_MESSAGE).to_string(),
    }))
}

/// First check row whose predicate holds; `None` means no classification
pub fn lookup(evaluator: &ConditionEvaluator, rows: &[CheckRow], record: &Record) -> Option<CheckMatch> {
    rows.iter()
        .find(|row| evaluator.evaluate(&row.as_condition(), record))
        .map(|row| CheckMatch {
            row_id: row.id.clone(),
            result: row.result.clone(),
        })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::types::ConditionOperator;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn check_row(id: i64, operator: ConditionOperator, value: Value, result: &str) -> CheckRow {
        CheckRow {
            id: ItemId::Number(id),
            field: "revenue".into(),
            operator,
            value,
            result: json!(result),
        }
    }

    #[test]
    fn test_pattern_pass_and_fail() {
        let evaluator = ConditionEvaluator::new();
        let pattern = r"^\d{5}$";

        let ok = validate_pattern(&evaluator, "zip", pattern, None, &record(json!({"zip": "12345"})));
        assert_eq!(ok.unwrap(), None);

        let bad = validate_pattern(&evaluator, "zip", pattern, Some("ZIP must have 5 digits"), &record(json!({"zip": 123})))
            .unwrap()
            .unwrap();
        assert_eq!(bad.field, "zip");
        assert_eq!(bad.message, "ZIP must have 5 digits");

        let absent = validate_pattern(&evaluator, "zip", pattern, None, &Record::new())
            .unwrap()
            .unwrap();
        assert_eq!(absent.message, DEFAULT_PATTERN_MESSAGE);
    }

    #[test]
    fn test_invalid_pattern() {
        let evaluator = ConditionEvaluator::new();
        let result = validate_pattern(&evaluator, "zip", "(", None, &Record::new());
        assert!(matches!(result, Err(DefinitionError::InvalidRegex { .. })));
    }

    #[test]
    fn test_lookup_first_match_in_array_order() {
        let evaluator = ConditionEvaluator::new();
        let rows = vec![
            check_row(1, ConditionOperator::GreaterThan, json!(1_000_000), "enterprise"),
            check_row(2, ConditionOperator::GreaterThan, json!(10_000), "mid-market"),
            check_row(3, ConditionOperator::GreaterThan, json!(0), "small"),
        ];

        let hit = lookup(&evaluator, &rows, &record(json!({"revenue": 50_000}))).unwrap();
        assert_eq!(hit.row_id, ItemId::Number(2));
        assert_eq!(hit.result, json!("mid-market"));

        assert_eq!(lookup(&evaluator, &rows, &record(json!({"revenue": -5}))), None);
        assert_eq!(lookup(&evaluator, &rows, &Record::new()), None);
    }
}
