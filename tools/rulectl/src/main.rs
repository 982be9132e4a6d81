//! rulectl - command line front end of the governance rule engine
//!
//! Results are printed as pretty JSON on stdout; logs go to stderr.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::logging::{self, LogConfig};
use governance_rules::{EngineConfig, RuleEngine};

#[derive(Parser)]
#[command(name = "rulectl")]
#[command(about = "Evaluate and check master-data governance rules")]
#[command(long_about = "Evaluate and check master-data governance rules

Commands:
  eval     Evaluate one rule against one record
  bulk     Evaluate a rule set against one record
  check    Report definition errors of rule files

Examples:
  rulectl eval --rule email.json --record customer.json
  rulectl eval --rule email.json --record customer.json --preview
  rulectl bulk --rules customer-rules.json --record customer.json --concurrent
  rulectl check --rule customer-rules.json

Environment variables prefixed with RULES_ override the config file
(e.g. RULES_EFFECTIVE_THRESHOLD=0.9).")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (toml, yaml or json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Also write daily log files into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one rule against one record
    Eval {
        /// Rule JSON file
        #[arg(long)]
        rule: PathBuf,

        /// Record JSON file (an object)
        #[arg(long)]
        record: PathBuf,

        /// Evaluate without recording statistics
        ///
        /// Otherwise the rule's stored statistics are loaded, updated by this
        /// evaluation and printed next to the result.
        #[arg(long)]
        preview: bool,
    },

    /// Evaluate a rule set (JSON array) against one record
    Bulk {
        /// Rules JSON file (an array of rules)
        #[arg(long)]
        rules: PathBuf,

        /// Record JSON file (an object)
        #[arg(long)]
        record: PathBuf,

        /// Evaluate rules independently on separate tasks
        #[arg(long)]
        concurrent: bool,
    },

    /// Report definition errors of a rule or rule set
    Check {
        /// Rule JSON file (a rule or an array of rules)
        #[arg(long)]
        rule: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = EngineConfig::load(cli.config.as_deref()).context("Failed to load engine config")?;

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    logging::init_with_config(LogConfig {
        app_name: "rulectl".to_string(),
        level,
        log_dir: cli.log_dir.clone(),
        ansi: !cli.no_color,
    })?;

    let engine = Arc::new(RuleEngine::with_config(config)?);

    let passed = match cli.command {
        Commands::Eval {
            rule,
            record,
            preview,
        } => commands::eval(&engine, &rule, &record, preview)?,
        Commands::Bulk {
            rules,
            record,
            concurrent,
        } => commands::bulk(&engine, &rules, &record, concurrent).await?,
        Commands::Check { rule } => commands::check(&engine, &rule)?,
    };

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
