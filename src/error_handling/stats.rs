//! Invocation statistics tracking.
//!
//! This module provides thread-safe counters for attempts, outcomes and
//! failure categories observed by a `RetryingInvoker`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use strum::IntoEnumIterator;

use super::types::FailureClass;

/// Thread-safe invocation statistics tracker.
///
/// All counters are atomic, so one tracker can be shared across tasks using
/// `Arc`. Every `FailureClass` is initialized to zero on creation.
pub struct InvocationStats {
    attempts: AtomicUsize,
    successes: AtomicUsize,
    retries: AtomicUsize,
    exhausted: AtomicUsize,
    fatal: AtomicUsize,
    failures: HashMap<FailureClass, AtomicUsize>,
}

/// Point-in-time copy of `InvocationStats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub attempts: usize,
    pub successes: usize,
    pub retries: usize,
    pub exhausted: usize,
    pub fatal: usize,
    pub failures: Vec<(String, usize)>,
}

impl Default for InvocationStats {
    fn default() -> Self {
        Self::new()
    }
}

impl InvocationStats {
    pub fn new() -> Self {
        let mut failures = HashMap::new();
        for class in FailureClass::iter() {
            failures.insert(class, AtomicUsize::new(0));
        }

        InvocationStats {
            attempts: AtomicUsize::new(0),
            successes: AtomicUsize::new(0),
            retries: AtomicUsize::new(0),
            exhausted: AtomicUsize::new(0),
            fatal: AtomicUsize::new(0),
            failures,
        }
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// An invocation gave up after a retryable failure on its last attempt.
    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    /// An invocation stopped on a non-retryable failure.
    pub fn record_fatal(&self) {
        self.fatal.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment a failure counter.
    pub fn record_failure(&self, class: FailureClass) {
        if let Some(counter) = self.failures.get(&class) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment failure counter for {:?} which is not in the map. \
                 This indicates a bug in InvocationStats initialization.",
                class
            );
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn retries(&self) -> usize {
        self.retries.load(Ordering::SeqCst)
    }

    pub fn exhausted(&self) -> usize {
        self.exhausted.load(Ordering::SeqCst)
    }

    pub fn fatal(&self) -> usize {
        self.fatal.load(Ordering::SeqCst)
    }

    /// Get the count for a failure class.
    pub fn failure_count(&self, class: FailureClass) -> usize {
        self.failures
            .get(&class)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn total_failures(&self) -> usize {
        self.failures.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            attempts: self.attempts(),
            successes: self.successes(),
            retries: self.retries(),
            exhausted: self.exhausted(),
            fatal: self.fatal(),
            failures: FailureClass::iter()
                .map(|class| (class.as_str().to_string(), self.failure_count(class)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_initialization() {
        let stats = InvocationStats::new();
        for class in FailureClass::iter() {
            assert_eq!(stats.failure_count(class), 0);
        }
        assert_eq!(stats.attempts(), 0);
        assert_eq!(stats.total_failures(), 0);
    }

    #[test]
    fn test_stats_increment() {
        let stats = InvocationStats::new();
        stats.record_attempt();
        stats.record_attempt();
        stats.record_failure(FailureClass::RateLimited);
        stats.record_retry();
        stats.record_success();

        assert_eq!(stats.attempts(), 2);
        assert_eq!(stats.failure_count(FailureClass::RateLimited), 1);
        assert_eq!(stats.failure_count(FailureClass::ServerError), 0);
        assert_eq!(stats.retries(), 1);
        assert_eq!(stats.successes(), 1);
        assert_eq!(stats.total_failures(), 1);
    }

    #[test]
    fn test_snapshot_lists_every_class() {
        let stats = InvocationStats::new();
        stats.record_failure(FailureClass::Transport);
        stats.record_exhausted();
        stats.record_fatal();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.failures.len(), FailureClass::iter().count());
        assert!(snapshot
            .failures
            .contains(&(FailureClass::Transport.as_str().to_string(), 1)));
        assert_eq!(snapshot.exhausted, 1);
        assert_eq!(snapshot.fatal, 1);

        let json = serde_json::to_string(&snapshot).expect("snapshot should serialize");
        assert!(json.contains("\"exhausted\":1"));
    }
}
