//! Rule Engine Error Types

use serde::Serialize;
use thiserror::Error;

/// Result type for rule operations
pub type Result<T> = std::result::Result<T, RuleError>;

/// Rule engine errors
///
/// These abort a single evaluation. Problems with a rule definition are not
/// raised through this type; they are reported as [`DefinitionError`]s inside
/// the evaluation result.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Unexpected internal error (e.g. the record is not a mapping)
    #[error("Evaluation fault: {0}")]
    EvaluationFault(String),

    /// Invalid rule format
    #[error("Invalid rule format: {0}")]
    InvalidFormat(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RuleError {
    pub fn fault(msg: impl Into<String>) -> Self {
        Self::EvaluationFault(msg.into())
    }

    /// Whether this error is an evaluation fault (as opposed to bad input files)
    pub fn is_fault(&self) -> bool {
        matches!(self, RuleError::EvaluationFault(_))
    }
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::SerializationError(err.to_string())
    }
}

impl From<common::Error> for RuleError {
    fn from(err: common::Error) -> Self {
        RuleError::ConfigError(err.to_string())
    }
}

/// Malformed rule definition
///
/// Surfaced to the caller inside the evaluation result, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DefinitionError {
    #[error("Invalid regex for field '{field}': {pattern}: {reason}")]
    #[serde(rename_all = "camelCase")]
    InvalidRegex {
        field: String,
        pattern: String,
        reason: String,
    },

    #[error("Unknown sentinel '{name}' in action {action_id}")]
    #[serde(rename_all = "camelCase")]
    UnknownSentinel { action_id: String, name: String },

    #[error("Unknown calculation '{name}' in action {action_id}")]
    #[serde(rename_all = "camelCase")]
    UnknownCalculation { action_id: String, name: String },

    #[error("Invalid calculation in action {action_id}: {reason}")]
    #[serde(rename_all = "camelCase")]
    InvalidCalculation { action_id: String, reason: String },

    #[error("Action {action_id} ({action_type}) requires a value")]
    #[serde(rename_all = "camelCase")]
    MissingValue {
        action_id: String,
        action_type: String,
    },

    #[error("Action {action_id} ({action_type}) requires a message")]
    #[serde(rename_all = "camelCase")]
    MissingMessage {
        action_id: String,
        action_type: String,
    },

    #[error("Action {action_id} has no target field")]
    #[serde(rename_all = "camelCase")]
    MissingActionField { action_id: String },

    #[error("Decision row {row_id} has no conditions")]
    #[serde(rename_all = "camelCase")]
    EmptyDecisionRow { row_id: String },

    #[error("Rule scope is dataObject but no dataObject is named")]
    MissingDataObject,

    #[error("Regex pattern set but the rule names no target field")]
    MissingRegexField,
}
