//! Metrics hooks for FIB operations
//!
//! Counters and timings for table construction and request lookups. The
//! min/max timings mirror what an evaluation run reports per phase.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use rid_fib::metrics::FibMetrics;
//! use rid_fib::{Fib, FibConfig, ForwardingTableApi};
//!
//! let metrics = Arc::new(FibMetrics::new());
//! let mut fib = Fib::with_metrics(FibConfig::default(), metrics.clone()).unwrap();
//!
//! fib.insert_prefix("cmu.edu/cylab").unwrap();
//! fib.lookup_request("cmu.edu/cylab/ph").unwrap();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.entries_inserted, 1);
//! assert_eq!(snapshot.lookups_performed, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Metrics collector for FIB operations
pub struct FibMetrics {
    /// Forwarding entries added
    pub entries_inserted: AtomicU64,
    /// Inserts ignored because the RID already existed in its size class
    pub duplicates_ignored: AtomicU64,
    /// Prefixes that failed to encode
    pub prefixes_rejected: AtomicU64,
    /// Requests looked up
    pub lookups_performed: AtomicU64,
    /// Requests smaller than every size class
    pub lookups_without_size_class: AtomicU64,
    /// Trie nodes visited across all lookups
    pub nodes_visited: AtomicU64,
    /// Cumulative insert time in nanoseconds
    pub insert_time_ns: AtomicU64,
    pub min_insert_ns: AtomicU64,
    pub max_insert_ns: AtomicU64,
    /// Cumulative lookup time in nanoseconds
    pub lookup_time_ns: AtomicU64,
    pub min_lookup_ns: AtomicU64,
    pub max_lookup_ns: AtomicU64,
}

impl Default for FibMetrics {
    fn default() -> Self {
        Self {
            entries_inserted: AtomicU64::new(0),
            duplicates_ignored: AtomicU64::new(0),
            prefixes_rejected: AtomicU64::new(0),
            lookups_performed: AtomicU64::new(0),
            lookups_without_size_class: AtomicU64::new(0),
            nodes_visited: AtomicU64::new(0),
            insert_time_ns: AtomicU64::new(0),
            min_insert_ns: AtomicU64::new(u64::MAX),
            max_insert_ns: AtomicU64::new(0),
            lookup_time_ns: AtomicU64::new(0),
            min_lookup_ns: AtomicU64::new(u64::MAX),
            max_lookup_ns: AtomicU64::new(0),
        }
    }
}

impl FibMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful insertion
    pub fn record_insert(&self, duration: Duration) {
        let ns = duration.as_nanos() as u64;
        self.entries_inserted.fetch_add(1, Ordering::Relaxed);
        self.insert_time_ns.fetch_add(ns, Ordering::Relaxed);
        self.min_insert_ns.fetch_min(ns, Ordering::Relaxed);
        self.max_insert_ns.fetch_max(ns, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.prefixes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup and the number of trie nodes it visited
    pub fn record_lookup(&self, duration: Duration, visited: usize) {
        let ns = duration.as_nanos() as u64;
        self.lookups_performed.fetch_add(1, Ordering::Relaxed);
        self.nodes_visited.fetch_add(visited as u64, Ordering::Relaxed);
        self.lookup_time_ns.fetch_add(ns, Ordering::Relaxed);
        self.min_lookup_ns.fetch_min(ns, Ordering::Relaxed);
        self.max_lookup_ns.fetch_max(ns, Ordering::Relaxed);
    }

    pub fn record_no_size_class(&self) {
        self.lookups_without_size_class.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inserted = self.entries_inserted.load(Ordering::Relaxed);
        let lookups = self.lookups_performed.load(Ordering::Relaxed);

        MetricsSnapshot {
            entries_inserted: inserted,
            duplicates_ignored: self.duplicates_ignored.load(Ordering::Relaxed),
            prefixes_rejected: self.prefixes_rejected.load(Ordering::Relaxed),
            lookups_performed: lookups,
            lookups_without_size_class: self.lookups_without_size_class.load(Ordering::Relaxed),
            nodes_visited: self.nodes_visited.load(Ordering::Relaxed),
            insert: TimingSummary::from_counters(
                inserted,
                &self.insert_time_ns,
                &self.min_insert_ns,
                &self.max_insert_ns,
            ),
            lookup: TimingSummary::from_counters(
                lookups,
                &self.lookup_time_ns,
                &self.min_lookup_ns,
                &self.max_lookup_ns,
            ),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.entries_inserted,
            &self.duplicates_ignored,
            &self.prefixes_rejected,
            &self.lookups_performed,
            &self.lookups_without_size_class,
            &self.nodes_visited,
            &self.insert_time_ns,
            &self.max_insert_ns,
            &self.lookup_time_ns,
            &self.max_lookup_ns,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.min_insert_ns.store(u64::MAX, Ordering::Relaxed);
        self.min_lookup_ns.store(u64::MAX, Ordering::Relaxed);
    }
}

/// Total/avg/min/max of one timed operation, in nanoseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingSummary {
    pub total_ns: u64,
    pub avg_ns: u64,
    pub min_ns: u64,
    pub max_ns: u64,
}

impl TimingSummary {
    fn from_counters(count: u64, total: &AtomicU64, min: &AtomicU64, max: &AtomicU64) -> Self {
        if count == 0 {
            return Self::default();
        }

        let total_ns = total.load(Ordering::Relaxed);
        Self {
            total_ns,
            avg_ns: total_ns / count,
            min_ns: min.load(Ordering::Relaxed),
            max_ns: max.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub entries_inserted: u64,
    pub duplicates_ignored: u64,
    pub prefixes_rejected: u64,
    pub lookups_performed: u64,
    pub lookups_without_size_class: u64,
    pub nodes_visited: u64,
    pub insert: TimingSummary,
    pub lookup: TimingSummary,
}

/// Trait for custom metrics recording implementations
pub trait MetricsRecorder: Send + Sync {
    fn record_insert(&self, duration: Duration);

    fn record_duplicate(&self);

    fn record_rejected(&self);

    fn record_lookup(&self, duration: Duration, visited: usize);

    fn record_no_size_class(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_insert(&self, _: Duration) {}
    fn record_duplicate(&self) {}
    fn record_rejected(&self) {}
    fn record_lookup(&self, _: Duration, _: usize) {}
    fn record_no_size_class(&self) {}
}

impl MetricsRecorder for FibMetrics {
    fn record_insert(&self, duration: Duration) {
        FibMetrics::record_insert(self, duration);
    }

    fn record_duplicate(&self) {
        FibMetrics::record_duplicate(self);
    }

    fn record_rejected(&self) {
        FibMetrics::record_rejected(self);
    }

    fn record_lookup(&self, duration: Duration, visited: usize) {
        FibMetrics::record_lookup(self, duration, visited);
    }

    fn record_no_size_class(&self) {
        FibMetrics::record_no_size_class(self);
    }
}
