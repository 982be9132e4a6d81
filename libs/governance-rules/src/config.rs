//! Engine configuration
//!
//! Loaded through `common::config`: defaults, then an optional file, then
//! `RULES_*` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::stats::DEFAULT_EFFECTIVENESS_THRESHOLD;

/// Environment variable prefix for engine settings
pub const ENV_PREFIX: &str = "RULES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Success rate a rule must exceed to count as effective
    pub effective_threshold: f64,
    /// Root directory of per-rule evaluation logs; disabled when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_log_dir: Option<PathBuf>,
    /// Log level used by the CLI logging bootstrap
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            effective_threshold: DEFAULT_EFFECTIVENESS_THRESHOLD,
            rule_log_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from defaults, an optional file and `RULES_*` env vars
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = common::config::load_config(ENV_PREFIX, path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.effective_threshold) {
            return Err(RuleError::ConfigError(format!(
                "effective_threshold must be within [0, 1], got {}",
                self.effective_threshold
            )));
        }
        if self.log_level.trim().is_empty() {
            return Err(RuleError::ConfigError("log_level is empty".to_string()));
        }
        Ok(())
    }
}
