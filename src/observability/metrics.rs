//! Metrics registry for examdex
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all operational counters
///
/// All counters use Relaxed atomics; readers may observe counters from
/// concurrently running queries in any interleaving.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Federated queries that produced a result
    queries_executed: AtomicU64,
    /// Federated queries that returned an error
    queries_failed: AtomicU64,
    /// Federated queries cancelled by the caller
    queries_cancelled: AtomicU64,
    /// Successful per-partition count calls
    partitions_counted: AtomicU64,
    /// Successful per-partition find calls
    partitions_fetched: AtomicU64,
    /// Partition calls that errored
    partition_failures: AtomicU64,
    /// Partition calls that timed out
    partition_timeouts: AtomicU64,
    /// Registry re-discoveries
    registry_refreshes: AtomicU64,
    /// Registry re-discoveries that failed closed
    registry_refresh_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Query metrics

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_cancelled(&self) {
        self.queries_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    // Partition metrics

    pub fn increment_partitions_counted(&self) {
        self.partitions_counted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_partitions_fetched(&self) {
        self.partitions_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_partition_failures(&self) {
        self.partition_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_partition_timeouts(&self) {
        self.partition_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    // Registry metrics

    pub fn increment_registry_refreshes(&self) {
        self.registry_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_registry_refresh_failures(&self) {
        self.registry_refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            queries_cancelled: self.queries_cancelled.load(Ordering::Relaxed),
            partitions_counted: self.partitions_counted.load(Ordering::Relaxed),
            partitions_fetched: self.partitions_fetched.load(Ordering::Relaxed),
            partition_failures: self.partition_failures.load(Ordering::Relaxed),
            partition_timeouts: self.partition_timeouts.load(Ordering::Relaxed),
            registry_refreshes: self.registry_refreshes.load(Ordering::Relaxed),
            registry_refresh_failures: self.registry_refresh_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_failed: u64,
    pub queries_cancelled: u64,
    pub partitions_counted: u64,
    pub partitions_fetched: u64,
    pub partition_failures: u64,
    pub partition_timeouts: u64,
    pub registry_refreshes: u64,
    pub registry_refresh_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();

        assert_eq!(snapshot.queries_executed, 0);
        assert_eq!(snapshot.partition_failures, 0);
        assert_eq!(snapshot.registry_refreshes, 0);
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_queries_executed();
        registry.increment_queries_executed();
        registry.increment_queries_failed();
        registry.increment_queries_cancelled();
        registry.increment_partitions_counted();
        registry.increment_partitions_fetched();
        registry.increment_partition_failures();
        registry.increment_partition_timeouts();
        registry.increment_registry_refreshes();
        registry.increment_registry_refresh_failures();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.queries_executed, 2);
        assert_eq!(snapshot.queries_failed, 1);
        assert_eq!(snapshot.queries_cancelled, 1);
        assert_eq!(snapshot.partitions_counted, 1);
        assert_eq!(snapshot.partitions_fetched, 1);
        assert_eq!(snapshot.partition_failures, 1);
        assert_eq!(snapshot.partition_timeouts, 1);
        assert_eq!(snapshot.registry_refreshes, 1);
        assert_eq!(snapshot.registry_refresh_failures, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.increment_partition_timeouts();

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["partition_timeouts"], 1);
        assert_eq!(json["queries_executed"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_partitions_counted();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.snapshot().partitions_counted, 1000);
    }
}
