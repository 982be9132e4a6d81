//! Logical Combinator - fold an ordered condition list into one boolean
//!
//! The logical operator stored on a condition describes its junction with the
//! condition that *follows* it. The fold runs left to right:
//!
//! ```text
//! r = e(c0)
//! r = r AND e(c1)        if c0.logicalOperator == AND
//! r = r OR  e(c1)        if c0.logicalOperator == OR
//! r = r AND NOT e(c1)    if c0.logicalOperator == NOT
//! ```
//!
//! The operator on the last condition is never consulted.

use crate::condition::ConditionEvaluator;
use crate::logger::format_condition;
use crate::types::{Condition, LogicalOperator, Record};
use serde::Serialize;

/// Result of evaluating a single condition (for traces)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionResult {
    /// The condition expression (e.g., "creditScore > 700")
    pub expression: String,
    /// Whether this condition evaluated to true
    pub result: bool,
}

/// Combine conditions left to right; an empty list is vacuously true
pub fn combine(evaluator: &ConditionEvaluator, conditions: &[Condition], record: &Record) -> bool {
    let Some((first, rest)) = conditions.split_first() else {
        return true;
    };

    let mut result = evaluator.evaluate(first, record);
    let mut junction = first.logical_operator;

    for cond in rest {
        result = match junction {
            LogicalOperator::And => result && evaluator.evaluate(cond, record),
            LogicalOperator::Or => result || evaluator.evaluate(cond, record),
            LogicalOperator::Not => result && !evaluator.evaluate(cond, record),
        };
        junction = cond.logical_operator;
    }

    result
}

/// Evaluate every condition without short-circuiting (for traces)
pub fn evaluate_all(
    evaluator: &ConditionEvaluator,
    conditions: &[Condition],
    record: &Record,
) -> Vec<ConditionResult> {
    conditions
        .iter()
        .map(|cond| ConditionResult {
            expression: format_condition(cond),
            result: evaluator.evaluate(cond, record),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::types::ConditionOperator;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn eq(field: &str, value: Value) -> Condition {
        Condition::new(field, ConditionOperator::Equals, value)
    }

    #[test]
    fn test_empty_list_is_vacuously_true() {
        let evaluator = ConditionEvaluator::new();
        assert!(combine(&evaluator, &[], &record(json!({}))));
    }

    #[test]
    fn test_credit_and_order_value() {
        let evaluator = ConditionEvaluator::new();
        let conditions = vec![
            Condition::new("creditScore", ConditionOperator::GreaterThan, json!(700))
                .then(LogicalOperator::And),
            Condition::new("orderValue", ConditionOperator::LessThan, json!(10000)),
        ];

        let r = record(json!({"creditScore": 750, "orderValue": 500}));
        assert!(combine(&evaluator, &conditions, &r));

        let r = record(json!({"creditScore": 650, "orderValue": 500}));
        assert!(!combine(&evaluator, &conditions, &r));
    }

    #[test]
    fn test_or_junction() {
        let evaluator = ConditionEvaluator::new();
        let conditions = vec![
            eq("a", json!("1")).then(LogicalOperator::Or),
            eq("b", json!("1")),
        ];

        assert!(combine(&evaluator, &conditions, &record(json!({"a": "0", "b": "1"}))));
        assert!(combine(&evaluator, &conditions, &record(json!({"a": "1", "b": "0"}))));
        assert!(!combine(&evaluator, &conditions, &record(json!({"a": "0", "b": "0"}))));
    }

    #[test]
    fn test_not_applies_to_following_condition() {
        let evaluator = ConditionEvaluator::new();
        // a == 1 AND NOT b == 1
        let conditions = vec![
            eq("a", json!("1")).then(LogicalOperator::Not),
            eq("b", json!("1")),
        ];

        assert!(combine(&evaluator, &conditions, &record(json!({"a": 1, "b": 2}))));
        assert!(!combine(&evaluator, &conditions, &record(json!({"a": 1, "b": 1}))));
        assert!(!combine(&evaluator, &conditions, &record(json!({"a": 2, "b": 2}))));
    }

    #[test]
    fn test_operator_belongs_to_previous_condition() {
        let evaluator = ConditionEvaluator::new();
        // (a OR b) AND c - the OR on `a` joins b, the AND on `b` joins c,
        // the OR on `c` is never consulted
        let conditions = vec![
            eq("a", json!("1")).then(LogicalOperator::Or),
            eq("b", json!("1")).then(LogicalOperator::And),
            eq("c", json!("1")).then(LogicalOperator::Or),
        ];

        assert!(combine(&evaluator, &conditions, &record(json!({"a": 1, "b": 0, "c": 1}))));
        assert!(!combine(&evaluator, &conditions, &record(json!({"a": 1, "b": 0, "c": 0}))));
        // left fold, not precedence: a AND b OR c == (a AND b) OR c
        let conditions = vec![
            eq("a", json!("1")),
            eq("b", json!("1")).then(LogicalOperator::Or),
            eq("c", json!("1")),
        ];
        assert!(combine(&evaluator, &conditions, &record(json!({"a": 0, "b": 0, "c": 1}))));
    }

    #[test]
    fn test_evaluate_all_reports_each_condition() {
        let evaluator = ConditionEvaluator::new();
        let conditions = vec![
            Condition::new("x", ConditionOperator::GreaterThan, json!(10)),
            eq("y", json!("a")),
        ];

        let results = evaluate_all(&evaluator, &conditions, &record(json!({"x": 5, "y": "a"})));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].expression, "x > 10");
        assert!(!results[0].result);
        assert!(results[1].result);
    }
}
