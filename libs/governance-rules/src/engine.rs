//! Rule Engine - evaluate governance rules against records
//!
//! Evaluates a rule by:
//! 1. Checking the rule definition (malformed rules fail without running)
//! 2. Running every declared strategy in a fixed order, each one feeding
//!    its updated record to the next:
//!    conditions/actions, decision table, check table, regex pattern
//! 3. Updating the rule's statistics (active and enabled rules only)

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::action::{ActionExecutor, ActionOutcome};
use crate::check::{lookup, validate_pattern};
use crate::combinator::{combine, evaluate_all};
use crate::condition::ConditionEvaluator;
use crate::config::EngineConfig;
use crate::decision::resolve_into;
use crate::definition::check_definition;
use crate::error::{Result, RuleError};
use crate::logger::{format_conditions, RuleLoggerManager};
use crate::result::{EvaluationResult, EvaluationStatus, PipelineResult, RuleEvaluation, RuleOutcome};
use crate::stats::{ExecutionOutcome, StatisticsTracker};
use crate::types::{Record, Rule};

/// Rule engine
///
/// `Send + Sync`; share it through `Arc` for concurrent evaluation.
pub struct RuleEngine {
    evaluator: ConditionEvaluator,
    executor: ActionExecutor,
    stats: StatisticsTracker,
    loggers: Option<RuleLoggerManager>,
    config: EngineConfig,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl RuleEngine {
    /// Create with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a validated configuration
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            evaluator: ConditionEvaluator::new(),
            executor: ActionExecutor::new(),
            stats: StatisticsTracker::new(config.effective_threshold),
            loggers: config.rule_log_dir.clone().map(RuleLoggerManager::new),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn statistics(&self) -> &StatisticsTracker {
        &self.stats
    }

    pub fn evaluator(&self) -> &ConditionEvaluator {
        &self.evaluator
    }

    // ========================================================================
    // Single rule
    // ========================================================================

    /// Evaluate a rule; active and enabled rules record statistics
    pub fn evaluate_rule(&self, rule: &Rule, record: &Record) -> EvaluationResult {
        self.run(rule, record, rule.is_eligible())
    }

    /// Evaluate a rule without touching its statistics
    pub fn preview_rule(&self, rule: &Rule, record: &Record) -> EvaluationResult {
        self.run(rule, record, false)
    }

    /// Evaluate against an arbitrary JSON value (must be an object)
    pub fn evaluate_value(&self, rule: &Rule, record: &Value) -> Result<EvaluationResult> {
        let record = record.as_object().ok_or_else(|| {
            RuleError::fault(format!("record must be an object, got {}", value_kind(record)))
        })?;
        Ok(self.evaluate_rule(rule, record))
    }

    fn run(&self, rule: &Rule, record: &Record, record_stats: bool) -> EvaluationResult {
        let rule_id = rule.rule_id();

        let definition_errors = check_definition(&self.evaluator, rule);
        let mut result = if definition_errors.is_empty() {
            self.apply_strategies(rule, record)
        } else {
            warn!("Rule {}: {} definition error(s)", rule_id, definition_errors.len());
            EvaluationResult {
                rule_id: rule_id.to_string(),
                status: EvaluationStatus::Failed,
                success: false,
                updated_record: record.clone(),
                messages: Vec::new(),
                failures: Vec::new(),
                matched_decision_row_id: None,
                check_result: None,
                directives: Vec::new(),
                definition_errors,
                statistics_recorded: false,
            }
        };

        if record_stats {
            self.stats.record_or_seed(
                rule_id,
                &rule.statistics,
                ExecutionOutcome::from(result.success),
            );
            result.statistics_recorded = true;
        }

        debug!(
            "Rule {}: {:?}, {} failure(s)",
            rule_id,
            result.status,
            result.failures.len()
        );

        if let Some(loggers) = &self.loggers {
            loggers.get_logger(rule_id).log_evaluation(&result);
        }

        result
    }

    fn apply_strategies(&self, rule: &Rule, record: &Record) -> EvaluationResult {
        let rule_id = rule.rule_id();
        let mut outcome = ActionOutcome::new(record.clone());
        let mut matched_row = None;
        let mut check_result = None;

        // Conditions and actions
        if !rule.conditions().is_empty()
            && !rule.actions().is_empty()
            && rule.decision_table().is_empty()
        {
            let passed = combine(&self.evaluator, rule.conditions(), &outcome.record);
            debug!(
                "Rule {}: {} => {}",
                rule_id,
                format_conditions(rule.conditions()),
                passed
            );
            if tracing::enabled!(tracing::Level::TRACE) {
                for cond in evaluate_all(&self.evaluator, rule.conditions(), &outcome.record) {
                    tracing::trace!("  {} = {}", cond.expression, cond.result);
                }
            }
            self.executor.apply_into(rule.actions(), passed, &mut outcome);
        }

        // Decision table
        if !rule.decision_table().is_empty() {
            matched_row = resolve_into(
                &self.evaluator,
                &self.executor,
                rule.decision_table(),
                &mut outcome,
            );
            if matched_row.is_none() {
                debug!("Rule {}: no decision row matched", rule_id);
            }
        }

        // Check table
        if !rule.check_table().is_empty() {
            if let Some(hit) = lookup(&self.evaluator, rule.check_table(), &outcome.record) {
                debug!("Rule {}: check row {} matched", rule_id, hit.row_id);
                if let Some(field) = rule.result_field.as_deref().filter(|f| !f.is_empty()) {
                    outcome.record.insert(field.to_string(), hit.result.clone());
                }
                check_result = Some(hit.result);
            }
        }

        // Regex pattern
        if let Some(pattern) = rule
            .regex_pattern()
            .filter(|_| rule.decision_table().is_empty())
        {
            let field = rule.field.as_deref().unwrap_or_default();
            match validate_pattern(
                &self.evaluator,
                field,
                pattern,
                rule.error_message.as_deref(),
                &outcome.record,
            ) {
                Ok(Some(failure)) => outcome.failures.push(failure),
                Ok(None) => {},
                Err(e) => outcome.definition_errors.push(e),
            }
        }

        let success = outcome.failures.is_empty() && outcome.definition_errors.is_empty();
        EvaluationResult {
            rule_id: rule_id.to_string(),
            status: if success {
                EvaluationStatus::Succeeded
            } else {
                EvaluationStatus::Failed
            },
            success,
            updated_record: outcome.record,
            messages: outcome.messages,
            failures: outcome.failures,
            matched_decision_row_id: matched_row,
            check_result,
            directives: outcome.directives,
            definition_errors: outcome.definition_errors,
            statistics_recorded: false,
        }
    }

    // ========================================================================
    // Bulk evaluation
    // ========================================================================

    /// Evaluate eligible rules in ascending priority, feeding records forward
    ///
    /// Rules with definition errors are reported but their record is not fed
    /// to the next rule. A panicking rule is reported as a fault and the
    /// pipeline continues.
    pub fn evaluate_pipeline(&self, rules: &[Rule], record: &Record) -> PipelineResult {
        self.pipeline_with(rules, record, Self::evaluate_rule)
    }

    fn pipeline_with<F>(&self, rules: &[Rule], record: &Record, evaluate: F) -> PipelineResult
    where
        F: Fn(&Self, &Rule, &Record) -> EvaluationResult,
    {
        let mut ordered: Vec<&Rule> = rules.iter().collect();
        ordered.sort_by_key(|rule| rule.priority);

        let mut current = record.clone();
        let mut results = Vec::with_capacity(ordered.len());

        for rule in ordered {
            let outcome = match skip_reason(rule) {
                Some(reason) => RuleOutcome::Skipped { reason },
                None => {
                    let evaluated =
                        panic::catch_unwind(AssertUnwindSafe(|| evaluate(self, rule, &current)));
                    match evaluated {
                        Ok(result) => {
                            if !result.has_definition_errors() {
                                current = result.updated_record.clone();
                            }
                            RuleOutcome::Evaluated {
                                result: Box::new(result),
                            }
                        },
                        Err(payload) => {
                            let message = panic_message(payload.as_ref());
                            error!("Rule {}: fault: {}", rule.rule_id(), message);
                            RuleOutcome::Fault { message }
                        },
                    }
                },
            };

            results.push(RuleEvaluation {
                rule_id: rule.rule_id().to_string(),
                priority: rule.priority,
                outcome,
            });
        }

        PipelineResult {
            results,
            final_record: current,
        }
    }

    /// Evaluate eligible rules independently against the same record
    ///
    /// Each rule runs on its own task. Results come back in ascending priority
    /// order; a failed task is reported as a fault for that rule only.
    pub async fn evaluate_concurrent(
        self: &Arc<Self>,
        rules: Vec<Arc<Rule>>,
        record: &Record,
    ) -> Vec<RuleEvaluation> {
        self.concurrent_with(rules, record, Self::evaluate_rule).await
    }

    async fn concurrent_with<F>(
        self: &Arc<Self>,
        mut rules: Vec<Arc<Rule>>,
        record: &Record,
        evaluate: F,
    ) -> Vec<RuleEvaluation>
    where
        F: Fn(&Self, &Rule, &Record) -> EvaluationResult + Send + Sync + 'static,
    {
        let evaluate = Arc::new(evaluate);
        rules.sort_by_key(|rule| rule.priority);
        let record = Arc::new(record.clone());

        let pending: Vec<_> = rules
            .into_iter()
            .map(|rule| match skip_reason(&rule) {
                Some(reason) => (rule, Err(reason)),
                None => {
                    let engine = Arc::clone(self);
                    let task_rule = Arc::clone(&rule);
                    let record = Arc::clone(&record);
                    let evaluate = Arc::clone(&evaluate);
                    let handle =
                        tokio::spawn(async move { evaluate(&engine, &task_rule, &record) });
                    (rule, Ok(handle))
                },
            })
            .collect();

        let mut results = Vec::with_capacity(pending.len());
        for (rule, task) in pending {
            let outcome = match task {
                Err(reason) => RuleOutcome::Skipped { reason },
                Ok(handle) => match handle.await {
                    Ok(result) => RuleOutcome::Evaluated {
                        result: Box::new(result),
                    },
                    Err(e) => {
                        error!("Rule {}: task fault: {}", rule.rule_id(), e);
                        RuleOutcome::Fault {
                            message: e.to_string(),
                        }
                    },
                },
            };
            results.push(RuleEvaluation {
                rule_id: rule.rule_id().to_string(),
                priority: rule.priority,
                outcome,
            });
        }

        results
    }

    // ========================================================================
    // Statistics side-channel
    // ========================================================================

    /// Copy tracked statistics onto the rule for persistence
    ///
    /// Returns `false` when the rule has never been tracked.
    pub fn apply_statistics(&self, rule: &mut Rule) -> bool {
        match self.stats.get(rule.rule_id()) {
            Some(stats) => {
                rule.statistics = stats;
                true
            },
            None => false,
        }
    }

    /// Load a rule's persisted counters into the tracker
    pub fn seed_statistics(&self, rule: &Rule) {
        self.stats.seed(rule.rule_id(), &rule.statistics);
    }
}

fn skip_reason(rule: &Rule) -> Option<String> {
    if !rule.enabled {
        Some("rule is disabled".to_string())
    } else if !rule.is_eligible() {
        Some(format!("rule status is {:?}", rule.status).to_lowercase())
    } else {
        None
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "evaluation panicked".to_string()
    }
}
