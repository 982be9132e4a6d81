//! Action Executor - apply an ordered action list to a record copy
//!
//! Actions run in list order and later actions observe earlier mutations.
//! `showMessage` runs whatever the paired condition set returned. When the
//! conditions held, the mutating and visibility actions run; when they failed,
//! `validate` actions record a validation failure each. Nothing here returns
//! an error: malformed actions are skipped and reported as definition errors
//! in the outcome.

use crate::calculation::Calculation;
use crate::error::DefinitionError;
use crate::sentinel::{resolve_value, ValueSource};
use crate::types::{Action, ActionType, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Expected, data-level outcome of a `validate` action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

/// UI visibility directive for the form-rendering collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDirective {
    pub field: String,
    pub visible: bool,
}

/// Accumulated effects of one or more action passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    pub record: Record,
    pub messages: Vec<String>,
    pub failures: Vec<ValidationFailure>,
    pub directives: Vec<FieldDirective>,
    pub definition_errors: Vec<DefinitionError>,
}

impl ActionOutcome {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            ..Default::default()
        }
    }
}

/// Action executor
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionExecutor;

impl ActionExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Apply actions to an owned record copy
    pub fn apply(&self, actions: &[Action], record: Record, conditions_passed: bool) -> ActionOutcome {
        let mut outcome = ActionOutcome::new(record);
        self.apply_into(actions, conditions_passed, &mut outcome);
        outcome
    }

    /// Apply actions on top of an existing outcome
    pub fn apply_into(&self, actions: &[Action], conditions_passed: bool, outcome: &mut ActionOutcome) {
        for action in actions {
            if conditions_passed || action.action_type == ActionType::ShowMessage {
                self.execute(action, outcome);
            } else if action.action_type == ActionType::Validate {
                let message = action
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Validation failed for field '{}'", action.field));
                outcome.failures.push(ValidationFailure {
                    field: action.field.clone(),
                    message,
                });
            }
        }
    }

    fn execute(&self, action: &Action, outcome: &mut ActionOutcome) {
        match action.action_type {
            ActionType::SetField | ActionType::SetValue => match resolve_value(action) {
                Ok(Some(ValueSource::Literal(value))) => {
                    outcome.record.insert(action.field.clone(), value);
                },
                Ok(Some(ValueSource::Sentinel(sentinel))) => {
                    let value = sentinel.apply(&action.field, &outcome.record);
                    tracing::trace!("Sentinel {} -> {}", sentinel.name(), action.field);
                    outcome.record.insert(action.field.clone(), value);
                },
                Ok(None) => {
                    tracing::warn!("Action {}: no value, skipped", action.id);
                },
                Err(e) => outcome.definition_errors.push(e),
            },
            ActionType::ClearField => {
                outcome.record.insert(action.field.clone(), Value::Null);
            },
            ActionType::ShowField | ActionType::HideField => {
                outcome.directives.push(FieldDirective {
                    field: action.field.clone(),
                    visible: action.action_type == ActionType::ShowField,
                });
            },
            ActionType::ShowMessage => {
                if let Some(message) = &action.message {
                    outcome.messages.push(message.clone());
                }
            },
            ActionType::Calculate => match Calculation::from_action(action) {
                Ok(calculation) => {
                    if let Some(value) = calculation.compute(&outcome.record) {
                        outcome.record.insert(action.field.clone(), value);
                    }
                },
                Err(e) => outcome.definition_errors.push(e),
            },
            ActionType::Validate => {},
        }
    }
}
