//! Static checks of a rule definition
//!
//! Run before any strategy so that malformed rules fail deterministically,
//! independent of which conditions a short-circuiting fold would have reached.

use crate::calculation::Calculation;
use crate::condition::ConditionEvaluator;
use crate::error::DefinitionError;
use crate::sentinel::resolve_value;
use crate::types::{Action, ActionType, Condition, ConditionOperator, Rule, RuleScope};
use crate::value::as_text;

/// Collect every definition problem of a rule
pub fn check_definition(evaluator: &ConditionEvaluator, rule: &Rule) -> Vec<DefinitionError> {
    let mut errors = Vec::new();

    if rule.scope == RuleScope::DataObject
        && rule.data_object.as_deref().map_or(true, |d| d.trim().is_empty())
    {
        errors.push(DefinitionError::MissingDataObject);
    }

    check_conditions(evaluator, rule.conditions(), &mut errors);
    check_actions(rule.actions(), &mut errors);

    for row in rule.decision_table() {
        if row.conditions.is_empty() {
            errors.push(DefinitionError::EmptyDecisionRow {
                row_id: row.id.to_string(),
            });
        }
        check_conditions(evaluator, &row.conditions, &mut errors);
        check_actions(&row.actions, &mut errors);
    }

    for row in rule.check_table() {
        if row.operator == ConditionOperator::Regex {
            let pattern = as_text(&row.value).unwrap_or_default();
            if let Err(e) = evaluator.check_pattern(&row.field, &pattern) {
                errors.push(e);
            }
        }
    }

    if let Some(pattern) = rule.regex_pattern() {
        if rule.decision_table().is_empty() {
            match rule.field.as_deref().filter(|f| !f.is_empty()) {
                Some(field) => {
                    if let Err(e) = evaluator.check_pattern(field, pattern) {
                        errors.push(e);
                    }
                },
                None => errors.push(DefinitionError::MissingRegexField),
            }
        }
    }

    errors
}

fn check_conditions(
    evaluator: &ConditionEvaluator,
    conditions: &[Condition],
    errors: &mut Vec<DefinitionError>,
) {
    for cond in conditions
        .iter()
        .filter(|c| c.operator == ConditionOperator::Regex)
    {
        let pattern = as_text(&cond.value).unwrap_or_default();
        if let Err(e) = evaluator.check_pattern(&cond.field, &pattern) {
            errors.push(e);
        }
    }
}

fn check_actions(actions: &[Action], errors: &mut Vec<DefinitionError>) {
    for action in actions {
        let action_id = action.id.to_string();
        let action_type = serde_json::to_value(action.action_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        if action.field.is_empty() && action.action_type != ActionType::ShowMessage {
            errors.push(DefinitionError::MissingActionField {
                action_id: action_id.clone(),
            });
        }

        if action.action_type.requires_value() && action.value.is_none() {
            errors.push(DefinitionError::MissingValue {
                action_id: action_id.clone(),
                action_type: action_type.clone(),
            });
        }

        if action.action_type.requires_message()
            && action.message.as_deref().map_or(true, str::is_empty)
        {
            errors.push(DefinitionError::MissingMessage {
                action_id: action_id.clone(),
                action_type,
            });
        }

        match action.action_type {
            ActionType::SetField | ActionType::SetValue => {
                if let Err(e) = resolve_value(action) {
                    errors.push(e);
                }
            },
            ActionType::Calculate if action.value.is_some() => {
                if let Err(e) = Calculation::from_action(action) {
                    errors.push(e);
                }
            },
            _ => {},
        }
    }
}
