//! Integration tests for bulk evaluation
//!
//! Covers the sequential pipeline (records fed forward in priority order) and
//! independent concurrent evaluation on tokio tasks.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use std::sync::Arc;

use governance_rules::{Record, Rule, RuleEngine, RuleOutcome};
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn rule(value: Value) -> Rule {
    serde_json::from_value(value).unwrap()
}

/// Three active rules plus a draft, declared out of priority order
fn customer_rules() -> Vec<Rule> {
    vec![
        rule(json!({
            "ruleId": "BR-DISCOUNT",
            "name": "Tier discount",
            "status": "active",
            "priority": 30,
            "conditions": [{"field": "customerTier", "operator": "isNotEmpty"}],
            "actions": [{"type": "calculate", "field": "discount", "value": "discountByTier"}]
        })),
        rule(json!({
            "ruleId": "BR-TIER",
            "name": "Tier from credit score",
            "status": "active",
            "priority": 10,
            "decisionTable": [
                {
                    "id": 1,
                    "priority": 1,
                    "conditions": [{"field": "creditScore", "operator": "greaterThanOrEqual", "value": 800}],
                    "actions": [{"type": "setField", "field": "customerTier", "value": "platinum"}]
                },
                {
                    "id": 2,
                    "priority": 2,
                    "conditions": [{"field": "creditScore", "operator": "greaterThanOrEqual", "value": 650}],
                    "actions": [{"type": "setField", "field": "customerTier", "value": "gold"}]
                }
            ]
        })),
        rule(json!({
            "ruleId": "BR-DRAFT",
            "name": "Not yet approved",
            "status": "draft",
            "priority": 0,
            "conditions": [{"field": "creditScore", "operator": "greaterThan", "value": 0}],
            "actions": [{"type": "setField", "field": "draftTouched", "value": true}]
        })),
        rule(json!({
            "ruleId": "BR-NAME",
            "name": "Name required",
            "status": "active",
            "priority": 20,
            "conditions": [{"field": "name", "operator": "isNotEmpty"}],
            "actions": [{"type": "validate", "field": "name", "message": "Name is required"}]
        })),
    ]
}

#[test]
fn test_pipeline_feeds_records_forward_in_priority_order() {
    let engine = RuleEngine::new();
    let result = engine.evaluate_pipeline(
        &customer_rules(),
        &record(json!({"name": "Acme", "creditScore": 700})),
    );

    let order: Vec<&str> = result.results.iter().map(|r| r.rule_id.as_str()).collect();
    assert_eq!(order, vec!["BR-DRAFT", "BR-TIER", "BR-NAME", "BR-DISCOUNT"]);

    assert!(matches!(result.results[0].outcome, RuleOutcome::Skipped { .. }));
    assert_eq!(result.final_record["customerTier"], json!("gold"));
    assert_eq!(result.final_record["discount"], json!(0.15));
    assert!(!result.final_record.contains_key("draftTouched"));
    assert!(result.all_succeeded());
}

#[test]
fn test_pipeline_collects_validation_failures() {
    let engine = RuleEngine::new();
    let result = engine.evaluate_pipeline(&customer_rules(), &record(json!({"creditScore": 500})));

    let failures = result.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].message, "Name is required");
    assert!(!result.all_succeeded());

    // No tier matched, so the discount rule's conditions failed silently
    assert!(!result.final_record.contains_key("discount"));
}

#[test]
fn test_pipeline_does_not_feed_broken_rules_forward() {
    let engine = RuleEngine::new();
    let mut rules = customer_rules();
    rules.push(rule(json!({
        "ruleId": "BR-BROKEN",
        "name": "Broken",
        "status": "active",
        "priority": 15,
        "conditions": [{"field": "name", "operator": "regex", "value": "(unclosed"}],
        "actions": [{"type": "setField", "field": "customerTier", "value": "bronze"}]
    })));

    let result = engine.evaluate_pipeline(&rules, &record(json!({"name": "Acme", "creditScore": 820})));

    let broken = result
        .results
        .iter()
        .find(|r| r.rule_id == "BR-BROKEN")
        .and_then(|r| r.result())
        .unwrap();
    assert!(broken.has_definition_errors());

    assert_eq!(result.final_record["customerTier"], json!("platinum"));
    assert_eq!(result.final_record["discount"], json!(0.2));

    let serialized = serde_json::to_value(&result).unwrap();
    assert_eq!(serialized["results"][0]["outcome"], json!("skipped"));
    assert_eq!(serialized["results"][1]["outcome"], json!("evaluated"));
    assert_eq!(serialized["results"][1]["ruleId"], json!("BR-TIER"));
}

#[test]
fn test_pipeline_records_statistics_for_eligible_rules_only() {
    let engine = RuleEngine::new();
    let mut rules = customer_rules();
    engine.evaluate_pipeline(&rules, &record(json!({"name": "Acme", "creditScore": 700})));
    engine.evaluate_pipeline(&rules, &record(json!({"creditScore": 700})));

    for rule in rules.iter_mut() {
        engine.apply_statistics(rule);
    }
    let stats = |id: &str| {
        rules
            .iter()
            .find(|r| r.rule_id() == id)
            .map(|r| r.statistics.clone())
            .unwrap()
    };

    assert_eq!(stats("BR-DRAFT").execution_count, 0);
    assert_eq!(stats("BR-TIER").execution_count, 2);
    assert_eq!(stats("BR-NAME").success_count, 1);
    assert_eq!(stats("BR-NAME").failure_count, 1);
    assert!((stats("BR-NAME").success_rate - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_concurrent_evaluation_is_independent() {
    let engine = Arc::new(RuleEngine::new());
    let rules: Vec<Arc<Rule>> = customer_rules().into_iter().map(Arc::new).collect();
    let input = record(json!({"name": "Acme", "creditScore": 700, "customerTier": "silver"}));

    let results = engine.evaluate_concurrent(rules, &input).await;
    let order: Vec<&str> = results.iter().map(|r| r.rule_id.as_str()).collect();
    assert_eq!(order, vec!["BR-DRAFT", "BR-TIER", "BR-NAME", "BR-DISCOUNT"]);

    // Every rule sees the original record, not its predecessor's output
    let discount = results[3].result().unwrap();
    assert_eq!(discount.updated_record["discount"], json!(0.1));
    assert_eq!(discount.updated_record["customerTier"], json!("silver"));

    let tier = results[1].result().unwrap();
    assert_eq!(tier.updated_record["customerTier"], json!("gold"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_evaluation_of_one_rule_keeps_exact_counts() {
    let engine = Arc::new(RuleEngine::new());
    let name_rule = Arc::new(customer_rules().remove(3));

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = Arc::clone(&engine);
        let rule = Arc::clone(&name_rule);
        handles.push(tokio::spawn(async move {
            let input = if i % 2 == 0 {
                record(json!({"name": "Acme"}))
            } else {
                Record::new()
            };
            engine.evaluate_concurrent(vec![rule; 25], &input).await.len()
        }));
    }

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap();
    }
    assert_eq!(total, 400);

    let stats = engine.statistics().snapshot("BR-NAME");
    assert_eq!(stats.execution_count, 400);
    assert_eq!(stats.success_count, 200);
    assert_eq!(stats.failure_count, 200);
    assert!((stats.success_rate - 0.5).abs() < f64::EPSILON);
}
