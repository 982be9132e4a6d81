//! Decision Table Resolver - first matching row wins
//!
//! Rows are visited in ascending priority; rows without a priority come after
//! all prioritized rows, and ties keep their array order. A row's conditions
//! are folded with the same combinator as top-level conditions (AND unless a
//! condition carries another junction). Only the first matching row's actions
//! run. No match is a no-op, not an error.

use crate::action::{ActionExecutor, ActionOutcome};
use crate::combinator::combine;
use crate::condition::ConditionEvaluator;
use crate::error::DefinitionError;
use crate::types::{DecisionRow, ItemId, Record};

/// Result of resolving a decision table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionOutcome {
    /// Matched row identifier, if any row matched
    pub matched_row: Option<ItemId>,
    /// Record and side effects after running the matched row's actions
    pub actions: ActionOutcome,
}

/// Row visiting order: stable sort by priority, unprioritized rows last
pub fn ordered_rows(rows: &[DecisionRow]) -> Vec<&DecisionRow> {
    let mut ordered: Vec<&DecisionRow> = rows.iter().collect();
    ordered.sort_by_key(|row| row.priority.unwrap_or(i64::MAX));
    ordered
}

/// Find the first matching row without running any action
pub fn find_match<'a>(
    evaluator: &ConditionEvaluator,
    rows: &'a [DecisionRow],
    record: &Record,
) -> Option<&'a DecisionRow> {
    ordered_rows(rows)
        .into_iter()
        .filter(|row| !row.conditions.is_empty())
        .find(|row| combine(evaluator, &row.conditions, record))
}

/// Resolve a decision table against an owned record copy
pub fn resolve(
    evaluator: &ConditionEvaluator,
    executor: &ActionExecutor,
    rows: &[DecisionRow],
    record: Record,
) -> DecisionOutcome {
    let mut actions = ActionOutcome::new(record);
    let matched_row = resolve_into(evaluator, executor, rows, &mut actions);
    DecisionOutcome {
        matched_row,
        actions,
    }
}

/// Resolve a decision table on top of an existing outcome
///
/// Returns the identifier of the matched row.
pub fn resolve_into(
    evaluator: &ConditionEvaluator,
    executor: &ActionExecutor,
    rows: &[DecisionRow],
    outcome: &mut ActionOutcome,
) -> Option<ItemId> {
    for row in rows.iter().filter(|row| row.conditions.is_empty()) {
        outcome.definition_errors.push(DefinitionError::EmptyDecisionRow {
            row_id: row.id.to_string(),
        });
    }

    let row = find_match(evaluator, rows, &outcome.record)?;
    tracing::debug!("Decision row {} matched", row.id);
    executor.apply_into(&row.actions, true, outcome);
    Some(row.id.clone())
}
