//! Evaluation result types returned across the engine boundary

use crate::action::{FieldDirective, ValidationFailure};
use crate::error::DefinitionError;
use crate::types::{ItemId, Record};
use serde::Serialize;
use serde_json::Value;

/// Terminal state of one rule evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EvaluationStatus {
    Succeeded,
    Failed,
}

/// Result of evaluating one rule against one record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub rule_id: String,
    pub status: EvaluationStatus,
    pub success: bool,
    pub updated_record: Record,
    pub messages: Vec<String>,
    pub failures: Vec<ValidationFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_decision_row_id: Option<ItemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_result: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<FieldDirective>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub definition_errors: Vec<DefinitionError>,
    /// Whether this evaluation updated the rule's statistics
    pub statistics_recorded: bool,
}

impl EvaluationResult {
    /// Whether the rule failed because its definition is malformed
    pub fn has_definition_errors(&self) -> bool {
        !self.definition_errors.is_empty()
    }
}

/// Per-rule outcome inside a bulk evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RuleOutcome {
    Evaluated { result: Box<EvaluationResult> },
    Skipped { reason: String },
    Fault { message: String },
}

/// One entry of a bulk evaluation, in evaluation order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluation {
    pub rule_id: String,
    pub priority: i64,
    #[serde(flatten)]
    pub outcome: RuleOutcome,
}

impl RuleEvaluation {
    pub fn result(&self) -> Option<&EvaluationResult> {
        match &self.outcome {
            RuleOutcome::Evaluated { result } => Some(result),
            _ => None,
        }
    }
}

/// Result of a bulk evaluation over one record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub results: Vec<RuleEvaluation>,
    pub final_record: Record,
}

impl PipelineResult {
    /// True when every evaluated rule succeeded and nothing faulted
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| match &r.outcome {
            RuleOutcome::Evaluated { result } => result.success,
            RuleOutcome::Skipped { .. } => true,
            RuleOutcome::Fault { .. } => false,
        })
    }

    /// All validation failures across evaluated rules
    pub fn failures(&self) -> Vec<&ValidationFailure> {
        self.results
            .iter()
            .filter_map(RuleEvaluation::result)
            .flat_map(|r| r.failures.iter())
            .collect()
    }
}
