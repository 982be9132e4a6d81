//! Governance Rules - Business Rule Evaluation Engine
//!
//! Evaluates declarative master-data governance rules against records:
//! - Condition evaluation with a left-to-right logical fold
//! - Action execution (set/clear fields, visibility, messages, calculations)
//! - Priority-ordered decision tables and check-table lookups
//! - Regex pattern validation
//! - Per-rule statistics in a concurrent arena
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  RuleEngine  │────▶│  Definition  │────▶│  Strategies  │
//! │  (facade)    │     │  checker     │     │ cond/decision│
//! └──────────────┘     └──────────────┘     │ check/regex  │
//!        │                                  └──────────────┘
//!        ▼                                         │
//! ┌──────────────┐     ┌──────────────┐            ▼
//! │  Statistics  │     │  RuleLogger  │     ┌──────────────┐
//! │  (DashMap)   │     │ (daily file) │     │ActionExecutor│
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

pub mod action;
pub mod calculation;
pub mod check;
pub mod combinator;
pub mod condition;
mod config;
pub mod decision;
pub mod definition;
mod engine;
mod error;
pub mod logger;
mod result;
pub mod sentinel;
pub mod stats;
pub mod types;
mod value;

// Re-export public API
pub use action::{ActionExecutor, ActionOutcome, FieldDirective, ValidationFailure};
pub use combinator::{combine, ConditionResult};
pub use condition::ConditionEvaluator;
pub use config::{EngineConfig, ENV_PREFIX};
pub use definition::check_definition;
pub use engine::RuleEngine;
pub use error::{DefinitionError, Result, RuleError};
pub use logger::{format_conditions, RuleLogger, RuleLoggerManager};
pub use result::{EvaluationResult, EvaluationStatus, PipelineResult, RuleEvaluation, RuleOutcome};
pub use stats::{ExecutionOutcome, StatisticsTracker};

// Re-export rule types for convenience
pub use types::{
    Action, ActionType, CheckRow, Condition, ConditionOperator, DecisionRow, ItemId,
    LogicalOperator, Record, Rule, RuleLogic, RuleScope, RuleStatistics, RuleStatus, RuleType,
};
