//! Statistics Tracker
//!
//! Per-rule counters live in a shared arena keyed by rule id. Each rule owns a
//! set of atomic counters so concurrent evaluations never lose an update.
//!
//! Ordering: `execution` is incremented before `success`/`failure`, and
//! snapshots load `success`/`failure` before `execution`, so every snapshot
//! satisfies `success + failure <= execution`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::types::RuleStatistics;

/// Default success rate above which a rule counts as effective
pub const DEFAULT_EFFECTIVENESS_THRESHOLD: f64 = 0.8;

/// Outcome fed to the tracker for one recorded evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    Failure,
}

impl From<bool> for ExecutionOutcome {
    fn from(success: bool) -> Self {
        if success {
            ExecutionOutcome::Success
        } else {
            ExecutionOutcome::Failure
        }
    }
}

/// Atomic counters of one rule
#[derive(Debug, Default)]
pub struct RuleCounters {
    usage: AtomicU64,
    execution: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,
    last_executed_at: Mutex<Option<DateTime<Utc>>>,
}

impl RuleCounters {
    fn from_statistics(stats: &RuleStatistics) -> Self {
        Self {
            usage: AtomicU64::new(stats.usage_count),
            execution: AtomicU64::new(stats.execution_count),
            success: AtomicU64::new(stats.success_count),
            failure: AtomicU64::new(stats.failure_count),
            last_executed_at: Mutex::new(stats.last_executed_at),
        }
    }

    fn record(&self, outcome: ExecutionOutcome) {
        self.usage.fetch_add(1, Ordering::SeqCst);
        self.execution.fetch_add(1, Ordering::SeqCst);
        match outcome {
            ExecutionOutcome::Success => self.success.fetch_add(1, Ordering::SeqCst),
            ExecutionOutcome::Failure => self.failure.fetch_add(1, Ordering::SeqCst),
        };
        *self.last_executed_at.lock() = Some(Utc::now());
    }

    fn snapshot(&self, threshold: f64) -> RuleStatistics {
        let success_count = self.success.load(Ordering::SeqCst);
        let failure_count = self.failure.load(Ordering::SeqCst);
        let execution_count = self.execution.load(Ordering::SeqCst);
        let usage_count = self.usage.load(Ordering::SeqCst);

        let success_rate = if execution_count == 0 {
            0.0
        } else {
            (success_count as f64 / execution_count as f64).clamp(0.0, 1.0)
        };

        RuleStatistics {
            usage_count,
            execution_count,
            success_count,
            failure_count,
            success_rate,
            is_effective: execution_count > 0 && success_rate > threshold,
            last_executed_at: *self.last_executed_at.lock(),
        }
    }
}

/// Shared statistics arena
#[derive(Debug)]
pub struct StatisticsTracker {
    counters: DashMap<String, Arc<RuleCounters>>,
    threshold: f64,
}

impl Default for StatisticsTracker {
    fn default() -> Self {
        Self::new(DEFAULT_EFFECTIVENESS_THRESHOLD)
    }
}

impl StatisticsTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            counters: DashMap::new(),
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Counters of a rule, created on first use
    fn counters(&self, rule_id: &str) -> Arc<RuleCounters> {
        if let Some(existing) = self.counters.get(rule_id) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.counters
                .entry(rule_id.to_string())
                .or_default()
                .value(),
        )
    }

    /// Record one evaluation and return the updated snapshot
    pub fn record(&self, rule_id: &str, outcome: ExecutionOutcome) -> RuleStatistics {
        let counters = self.counters(rule_id);
        counters.record(outcome);
        counters.snapshot(self.threshold)
    }

    /// Record one evaluation, seeding from persisted counters on first use
    pub fn record_or_seed(
        &self,
        rule_id: &str,
        persisted: &RuleStatistics,
        outcome: ExecutionOutcome,
    ) -> RuleStatistics {
        let counters = Arc::clone(
            self.counters
                .entry(rule_id.to_string())
                .or_insert_with(|| Arc::new(RuleCounters::from_statistics(persisted)))
                .value(),
        );
        counters.record(outcome);
        counters.snapshot(self.threshold)
    }

    /// Statistics of a tracked rule
    pub fn get(&self, rule_id: &str) -> Option<RuleStatistics> {
        self.counters
            .get(rule_id)
            .map(|c| c.snapshot(self.threshold))
    }

    /// Current statistics; zeroed when the rule was never recorded
    pub fn snapshot(&self, rule_id: &str) -> RuleStatistics {
        self.get(rule_id).unwrap_or_default()
    }

    /// Load persisted counters, replacing whatever is tracked
    pub fn seed(&self, rule_id: &str, stats: &RuleStatistics) {
        self.counters.insert(
            rule_id.to_string(),
            Arc::new(RuleCounters::from_statistics(stats)),
        );
    }

    /// Zero the counters of a rule
    pub fn reset(&self, rule_id: &str) {
        self.counters
            .insert(rule_id.to_string(), Arc::new(RuleCounters::default()));
    }

    /// Forget a rule (e.g. when it is deleted)
    pub fn remove(&self, rule_id: &str) -> Option<RuleStatistics> {
        self.counters
            .remove(rule_id)
            .map(|(_, c)| c.snapshot(self.threshold))
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_record_and_rate() {
        let tracker = StatisticsTracker::default();
        for _ in 0..9 {
            tracker.record("R-1", ExecutionOutcome::Success);
        }
        let stats = tracker.record("R-1", ExecutionOutcome::Failure);

        assert_eq!(stats.execution_count, 10);
        assert_eq!(stats.usage_count, 10);
        assert_eq!(stats.success_count, 9);
        assert_eq!(stats.failure_count, 1);
        assert!((stats.success_rate - 0.9).abs() < f64::EPSILON);
        assert!(stats.is_effective);
        assert!(stats.last_executed_at.is_some());
    }

    #[test]
    fn test_threshold_is_strict() {
        let tracker = StatisticsTracker::new(0.8);
        for _ in 0..4 {
            tracker.record("R-1", ExecutionOutcome::Success);
        }
        let stats = tracker.record("R-1", ExecutionOutcome::Failure);
        assert!((stats.success_rate - 0.8).abs() < f64::EPSILON);
        assert!(!stats.is_effective);
    }

    #[test]
    fn test_unknown_rule_is_zeroed() {
        let tracker = StatisticsTracker::default();
        let stats = tracker.snapshot("missing");
        assert_eq!(stats, RuleStatistics::default());
        assert!(!stats.is_effective);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_seed_reset_remove() {
        let tracker = StatisticsTracker::default();
        let persisted = RuleStatistics {
            usage_count: 20,
            execution_count: 20,
            success_count: 15,
            failure_count: 5,
            ..Default::default()
        };
        tracker.seed("R-2", &persisted);

        let stats = tracker.record("R-2", ExecutionOutcome::Failure);
        assert_eq!(stats.execution_count, 21);
        assert_eq!(stats.failure_count, 6);

        tracker.reset("R-2");
        assert_eq!(tracker.snapshot("R-2").execution_count, 0);
        assert_eq!(tracker.len(), 1);

        assert!(tracker.remove("R-2").is_some());
        assert!(tracker.get("R-2").is_none());
        assert!(tracker.remove("R-2").is_none());
        assert_eq!(tracker.len(), 0);
    }

    #[test]
    fn test_record_or_seed_only_seeds_once() {
        let tracker = StatisticsTracker::default();
        let persisted = RuleStatistics {
            execution_count: 10,
            success_count: 8,
            failure_count: 2,
            ..Default::default()
        };

        let first = tracker.record_or_seed("R-3", &persisted, ExecutionOutcome::Failure);
        assert_eq!(first.execution_count, 11);
        assert_eq!(first.failure_count, 3);

        let second = tracker.record_or_seed("R-3", &persisted, ExecutionOutcome::Success);
        assert_eq!(second.execution_count, 12);
        assert_eq!(second.success_count, 9);
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let tracker = Arc::new(StatisticsTracker::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for n in 0..500 {
                        let outcome = ExecutionOutcome::from((i + n) % 4 != 0);
                        let snap = tracker.record("shared", outcome);
                        assert!(snap.success_count + snap.failure_count <= snap.execution_count);
                        assert!((0.0..=1.0).contains(&snap.success_rate));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = tracker.snapshot("shared");
        assert_eq!(stats.execution_count, 4000);
        assert_eq!(stats.success_count + stats.failure_count, 4000);
        assert_eq!(stats.failure_count, 1000);
    }
}
