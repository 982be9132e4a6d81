//! Command handlers
//!
//! Each handler prints its JSON result and returns whether everything passed.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colored::*;
use governance_rules::{check_definition, Record, Rule, RuleEngine, RuleOutcome};
use serde_json::{json, Value};
use tracing::{debug, info};

fn read_json(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Load a rule file holding one rule or an array of rules
pub fn load_rules(path: &Path) -> Result<Vec<Rule>> {
    let rules = match read_json(path)? {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item)
                    .with_context(|| format!("Invalid rule #{} in {}", i, path.display()))
            })
            .collect::<Result<Vec<Rule>>>()?,
        value => vec![serde_json::from_value(value)
            .with_context(|| format!("Invalid rule in {}", path.display()))?],
    };
    debug!("Loaded {} rule(s) from {}", rules.len(), path.display());
    Ok(rules)
}

pub fn load_record(path: &Path) -> Result<Record> {
    match read_json(path)? {
        Value::Object(record) => Ok(record),
        _ => bail!("Record in {} must be a JSON object", path.display()),
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_line(passed: bool, label: &str) {
    if passed {
        eprintln!("{} {}", "✓".green(), label);
    } else {
        eprintln!("{} {}", "✗".red(), label);
    }
}

/// Evaluate one rule
///
/// Outside preview the rule's stored statistics seed the tracker and the
/// updated statistics are printed with the result.
pub fn eval(engine: &RuleEngine, rule_path: &Path, record_path: &Path, preview: bool) -> Result<bool> {
    let rules = load_rules(rule_path)?;
    let [rule] = rules.as_slice() else {
        bail!("{} must hold exactly one rule", rule_path.display());
    };
    let record = load_record(record_path)?;

    let (result, statistics) = if preview {
        (engine.preview_rule(rule, &record), None)
    } else {
        engine.seed_statistics(rule);
        let result = engine.evaluate_rule(rule, &record);
        let mut updated = rule.clone();
        let statistics = (result.statistics_recorded && engine.apply_statistics(&mut updated))
            .then_some(updated.statistics);
        (result, statistics)
    };
    print_json(&json!({ "result": result, "statistics": statistics }))?;

    status_line(
        result.success,
        &format!("{} ({} failure(s))", rule.rule_id(), result.failures.len()),
    );
    Ok(result.success)
}

pub async fn bulk(
    engine: &Arc<RuleEngine>,
    rules_path: &Path,
    record_path: &Path,
    concurrent: bool,
) -> Result<bool> {
    let rules = load_rules(rules_path)?;
    let record = load_record(record_path)?;
    info!("Evaluating {} rule(s)", rules.len());

    let (results, passed) = if concurrent {
        let rules = rules.into_iter().map(Arc::new).collect();
        let results = engine.evaluate_concurrent(rules, &record).await;
        let passed = results.iter().all(|r| match &r.outcome {
            RuleOutcome::Evaluated { result } => result.success,
            RuleOutcome::Skipped { .. } => true,
            RuleOutcome::Fault { .. } => false,
        });
        (json!({ "results": results }), passed)
    } else {
        let pipeline = engine.evaluate_pipeline(&rules, &record);
        let passed = pipeline.all_succeeded();
        (serde_json::to_value(&pipeline)?, passed)
    };
    print_json(&results)?;

    status_line(passed, if passed { "all rules passed" } else { "rule failures" });
    Ok(passed)
}

pub fn check(engine: &RuleEngine, rule_path: &Path) -> Result<bool> {
    let rules = load_rules(rule_path)?;

    let mut passed = true;
    let report: Vec<Value> = rules
        .iter()
        .map(|rule| {
            let errors = check_definition(engine.evaluator(), rule);
            passed &= errors.is_empty();
            status_line(errors.is_empty(), rule.rule_id());
            json!({
                "ruleId": rule.rule_id(),
                "complexityScore": rule.complexity_score(),
                "definitionErrors": errors,
            })
        })
        .collect();
    print_json(&report)?;

    Ok(passed)
}
