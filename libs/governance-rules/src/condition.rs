//! Condition Evaluator - evaluate one atomic condition against a record
//!
//! Evaluation never fails on data shapes: missing fields, type mismatches and
//! unparsable numbers degrade to `false`. An invalid regex also evaluates to
//! `false`; `try_evaluate` reports it as a [`DefinitionError`].

use crate::error::DefinitionError;
use crate::types::{Condition, ConditionOperator, Record};
use crate::value::{as_number, as_text, field_text, is_empty};
use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;

/// Maximum number of compiled patterns kept before the cache is flushed
const PATTERN_CACHE_LIMIT: usize = 1024;

/// Shared cache of compiled regex patterns, keyed by pattern source
#[derive(Default)]
pub struct PatternCache {
    patterns: DashMap<String, Result<Regex, String>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile (or fetch) a pattern; the error is the compiler message
    pub fn compile(&self, pattern: &str) -> Result<Regex, String> {
        if let Some(entry) = self.patterns.get(pattern) {
            return entry.value().clone();
        }

        let compiled = Regex::new(pattern).map_err(|e| e.to_string());
        if self.patterns.len() >= PATTERN_CACHE_LIMIT {
            tracing::debug!("Pattern cache full ({}), flushing", PATTERN_CACHE_LIMIT);
            self.patterns.clear();
        }
        self.patterns.insert(pattern.to_string(), compiled.clone());
        compiled
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Condition evaluator
#[derive(Default)]
pub struct ConditionEvaluator {
    patterns: PatternCache,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate a condition; definition problems evaluate to `false`
    pub fn evaluate(&self, condition: &Condition, record: &Record) -> bool {
        self.try_evaluate(condition, record).unwrap_or(false)
    }

    /// Evaluate a condition, reporting an unparsable regex
    pub fn try_evaluate(
        &self,
        condition: &Condition,
        record: &Record,
    ) -> Result<bool, DefinitionError> {
        let actual = record.get(&condition.field);
        let expected = &condition.value;

        let result = match condition.operator {
            ConditionOperator::Equals => values_equal(actual, expected),
            ConditionOperator::NotEquals => !values_equal(actual, expected),
            ConditionOperator::GreaterThan => compare_numbers(actual, expected, |a, b| a > b),
            ConditionOperator::LessThan => compare_numbers(actual, expected, |a, b| a < b),
            ConditionOperator::GreaterThanOrEqual => {
                compare_numbers(actual, expected, |a, b| a >= b)
            },
            ConditionOperator::LessThanOrEqual => compare_numbers(actual, expected, |a, b| a <= b),
            ConditionOperator::Contains => contains(actual, expected),
            ConditionOperator::NotContains => actual.is_some() && !contains(actual, expected),
            ConditionOperator::StartsWith => {
                compare_text(actual, expected, |a, b| a.starts_with(b))
            },
            ConditionOperator::EndsWith => compare_text(actual, expected, |a, b| a.ends_with(b)),
            ConditionOperator::IsEmpty => is_empty(actual),
            ConditionOperator::IsNotEmpty => !is_empty(actual),
            ConditionOperator::Regex => {
                let pattern = as_text(expected).unwrap_or_default();
                let regex = self.patterns.compile(&pattern).map_err(|reason| {
                    DefinitionError::InvalidRegex {
                        field: condition.field.clone(),
                        pattern: pattern.to_string(),
                        reason,
                    }
                })?;
                field_text(actual).is_some_and(|text| regex.is_match(&text))
            },
        };

        Ok(result)
    }

    /// Test a raw pattern against a field value (regex validator path)
    pub fn matches_pattern(
        &self,
        field: &str,
        pattern: &str,
        record: &Record,
    ) -> Result<bool, DefinitionError> {
        let regex = self
            .patterns
            .compile(pattern)
            .map_err(|reason| DefinitionError::InvalidRegex {
                field: field.to_string(),
                pattern: pattern.to_string(),
                reason,
            })?;
        Ok(field_text(record.get(field)).is_some_and(|text| regex.is_match(&text)))
    }

    /// Check that a pattern compiles
    pub fn check_pattern(&self, field: &str, pattern: &str) -> Result<(), DefinitionError> {
        self.patterns
            .compile(pattern)
            .map(|_| ())
            .map_err(|reason| DefinitionError::InvalidRegex {
                field: field.to_string(),
                pattern: pattern.to_string(),
                reason,
            })
    }

    pub fn pattern_cache(&self) -> &PatternCache {
        &self.patterns
    }
}

/// String-coerced equality; null and absent only equal each other
fn values_equal(actual: Option<&Value>, expected: &Value) -> bool {
    field_text(actual) == as_text(expected)
}

fn compare_numbers(actual: Option<&Value>, expected: &Value, cmp: fn(f64, f64) -> bool) -> bool {
    match (actual.and_then(as_number), as_number(expected)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn compare_text(actual: Option<&Value>, expected: &Value, cmp: fn(&str, &str) -> bool) -> bool {
    match (field_text(actual), as_text(expected)) {
        (Some(a), Some(b)) => cmp(&a, &b),
        _ => false,
    }
}

/// Case-sensitive substring test; arrays match on an equal element
fn contains(actual: Option<&Value>, expected: &Value) -> bool {
    let Some(needle) = as_text(expected) else {
        return false;
    };
    match actual {
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| as_text(item).is_some_and(|text| text == needle)),
        other => field_text(other).is_some_and(|text| text.contains(&*needle)),
    }
}
