//! Rule evaluation logger
//!
//! Provides condition formatting for traces and independent log files for
//! each rule, capturing the outcome of every evaluation.

use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::{Local, Utc};
use tracing::warn;

use crate::result::EvaluationResult;
use crate::types::{Condition, LogicalOperator};
use crate::value::as_text;

/// Logger for individual rule evaluations
pub struct RuleLogger {
    rule_id: String,
    log_dir: PathBuf,
    current_date: Mutex<String>,
    current_file: Mutex<Option<File>>,
}

impl RuleLogger {
    /// Create a new RuleLogger for a specific rule
    ///
    /// Log files will be created in: `{log_root}/rules/{rule_id}/`
    /// with naming format: `{YYYYMMDD}_{rule_id}.log`
    pub fn new(log_root: &Path, rule_id: &str) -> Self {
        let rule_dir = log_root.join("rules").join(sanitize(rule_id));
        if let Err(e) = fs::create_dir_all(&rule_dir) {
            warn!("Log dir err {:?}: {}", rule_dir, e);
        }

        Self {
            rule_id: rule_id.to_string(),
            log_dir: rule_dir,
            current_date: Mutex::new(String::new()),
            current_file: Mutex::new(None),
        }
    }

    /// Directory holding this rule's log files
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Log one evaluation
    ///
    /// Format: `timestamp [RULE] rule_id STATUS | row | failures | messages`
    pub fn log_evaluation(&self, result: &EvaluationResult) {
        let status = if result.success { "OK" } else { "FAIL" };

        let row = result
            .matched_decision_row_id
            .as_ref()
            .map(|id| format!("row={}", id))
            .unwrap_or_else(|| "-".to_string());

        let failures = if result.has_definition_errors() {
            result
                .definition_errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        } else if result.failures.is_empty() {
            "no failure".to_string()
        } else {
            result
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.field, f.message))
                .collect::<Vec<_>>()
                .join("; ")
        };

        let message = format!(
            "{} | {} | {} | msgs={}",
            status,
            row,
            failures,
            result.messages.len()
        );
        self.write_line(&message);
    }

    fn write_line(&self, message: &str) {
        let today = Local::now().format("%Y%m%d").to_string();
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");

        let Ok(mut current_date) = self.current_date.lock() else {
            warn!("Date lock fail");
            return;
        };
        let Ok(mut file_guard) = self.current_file.lock() else {
            warn!("File lock fail");
            return;
        };

        if *current_date != today {
            // New day - open new file
            *current_date = today.clone();
            let file_path = self
                .log_dir
                .join(format!("{}_{}.log", today, sanitize(&self.rule_id)));

            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)
            {
                Ok(file) => *file_guard = Some(file),
                Err(e) => {
                    warn!("Log open err {:?}: {}", file_path, e);
                    return;
                },
            }
        }

        if let Some(ref mut file) = *file_guard {
            let line = format!("{} [RULE] {} {}\n", timestamp, self.rule_id, message);
            if let Err(e) = file.write_all(line.as_bytes()) {
                warn!("Log write err: {}", e);
            }
        }
    }
}

/// Keep rule ids usable as path components
///
/// Bytes outside `[A-Za-z0-9_-]` are percent-escaped, so distinct ids never
/// share a directory.
fn sanitize(rule_id: &str) -> String {
    let mut out = String::with_capacity(rule_id.len());
    for byte in rule_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Format one condition (e.g., "creditScore > 700" or "email isEmpty")
pub fn format_condition(cond: &Condition) -> String {
    let symbol = cond.operator.symbol();
    if cond.operator.is_unary() {
        return format!("{} {}", cond.field, symbol);
    }
    let value = as_text(&cond.value).unwrap_or(std::borrow::Cow::Borrowed("null"));
    format!("{} {} {}", cond.field, symbol, value)
}

/// Format conditions as expression string (e.g., "a > 10 AND b < 50")
///
/// Each junction is taken from the condition before it.
pub fn format_conditions(conditions: &[Condition]) -> String {
    let mut out = String::new();
    let mut junction: Option<LogicalOperator> = None;

    for cond in conditions {
        if let Some(op) = junction {
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
        }
        out.push_str(&format_condition(cond));
        junction = Some(cond.logical_operator);
    }

    out
}

/// Manager for multiple rule loggers
pub struct RuleLoggerManager {
    log_root: PathBuf,
    loggers: Mutex<HashMap<String, Arc<RuleLogger>>>,
}

impl RuleLoggerManager {
    /// Create a new logger manager
    pub fn new(log_root: PathBuf) -> Self {
        Self {
            log_root,
            loggers: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create a logger for a specific rule
    pub fn get_logger(&self, rule_id: &str) -> Arc<RuleLogger> {
        let Ok(mut loggers) = self.loggers.lock() else {
            warn!("Loggers lock fail, temp logger");
            return Arc::new(RuleLogger::new(&self.log_root, rule_id));
        };

        if let Some(logger) = loggers.get(rule_id) {
            return Arc::clone(logger);
        }

        let logger = Arc::new(RuleLogger::new(&self.log_root, rule_id));
        loggers.insert(rule_id.to_string(), Arc::clone(&logger));
        logger
    }

    /// Remove a logger (e.g., when rule is deleted)
    pub fn remove_logger(&self, rule_id: &str) {
        if let Ok(mut loggers) = self.loggers.lock() {
            loggers.remove(rule_id);
        }
    }
}
