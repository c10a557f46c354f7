//! # Size-Class Directory
//!
//! The FIB keeps one [`SizeClassBucket`] per declared prefix size. A bucket
//! owns the Patricia trie of that size, its aggregate statistics and the
//! running forwarding-entry-avoidance (FEA) average.
//!
//! A request of size `n` can only be matched by entries of size `<= n`, so a
//! lookup walks the buckets from the largest eligible size down to 1.
//!
//! FEA is the fraction of a trie a lookup did not have to visit. It is kept
//! as an incremental mean over lookups:
//!
//! ```text
//! sample = 1 - visited / trie_nodes      (root included)
//! fea   += (sample - fea) / samples
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::FibError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{ForwardingTableApi, RidEncoder};

use super::config::FibConfig;
use super::encoder::{BloomRidEncoder, EncodedPrefix};
use super::parallel::{dispatch_sequential, LookupCoordinator};
use super::rid::Rid;
use super::stats::{Classification, Statistics, StatsReport};
use super::trie::{Entry, InsertOutcome, Trie};

/// Trie, counters and FEA of one prefix size
#[derive(Clone, Debug)]
pub struct SizeClassBucket {
    size: usize,
    entries: usize,
    trie: Trie,
    stats: Statistics,
    fea: f64,
    fea_samples: u64,
    /// Per-entry counters keyed by prefix text, when enabled
    entry_stats: Option<HashMap<String, Statistics>>,
}

/// Result of one size class's traversal for one request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeClassOutcome {
    pub size: usize,
    pub tp: u32,
    pub fp: u32,
    pub visited: usize,
}

impl SizeClassBucket {
    pub fn new(size: usize, track_entry_stats: bool) -> Self {
        Self {
            size,
            entries: 0,
            trie: Trie::new(),
            stats: Statistics::new(size),
            fea: 0.0,
            fea_samples: 0,
            entry_stats: track_entry_stats.then(HashMap::new),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Forwarding entries held (root excluded)
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Running FEA average; 0 before the first lookup
    pub fn fea(&self) -> f64 {
        self.fea
    }

    pub fn fea_samples(&self) -> u64 {
        self.fea_samples
    }

    /// Counters of a single entry, if per-entry tracking is enabled
    pub fn entry_stats(&self, prefix: &str) -> Option<&Statistics> {
        self.entry_stats.as_ref()?.get(prefix)
    }

    /// Add an entry; an entry with an identical RID is left in place
    pub fn insert(&mut self, entry: Entry) -> Result<InsertOutcome, FibError> {
        let size = self.size;
        let prefix = self.entry_stats.is_some().then(|| entry.prefix.clone());

        let outcome = self.trie.insert(entry)?;
        if outcome.is_inserted() {
            self.entries += 1;
            if let (Some(map), Some(prefix)) = (self.entry_stats.as_mut(), prefix) {
                map.insert(prefix, Statistics::new(size));
            }
        }
        Ok(outcome)
    }

    pub fn remove(&mut self, rid: &Rid) -> Result<Entry, FibError> {
        let removed = self.trie.remove(rid)?;
        self.entries -= 1;
        if let Some(map) = self.entry_stats.as_mut() {
            map.remove(&removed.prefix);
        }
        Ok(removed)
    }

    /// Traverse this size class for one request and fold in the results
    pub fn lookup(&mut self, request: &Rid, request_name: &str) -> SizeClassOutcome {
        let Self {
            trie,
            stats,
            entry_stats,
            ..
        } = self;

        let (mut tp, mut fp) = (0u32, 0u32);
        let visited = trie.traverse(request, request_name, |visit| {
            stats.record_visit(visit.distance, visit.class);

            if let Some(entry) = entry_stats
                .as_mut()
                .and_then(|map| map.get_mut(visit.entry.prefix.as_str()))
            {
                entry.record_visit(visit.distance, visit.class);
            }

            match visit.class {
                Classification::TruePositive => tp += 1,
                Classification::FalsePositive => fp += 1,
                Classification::TrueNegative => {}
            }
        });

        let sample = 1.0 - visited as f64 / trie.len() as f64;
        self.fea_samples += 1;
        self.fea += (sample - self.fea) / self.fea_samples as f64;

        SizeClassOutcome {
            size: self.size,
            tp,
            fp,
            visited,
        }
    }

    /// Release the trie, returning the number of nodes freed
    pub fn erase(self) -> usize {
        self.trie.erase()
    }
}

/// Per-size TP/FP counts of one request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOutcome {
    /// FPs found in size class `i + 1`
    pub fp_by_size: Vec<u32>,
    /// TPs found in size class `i + 1`
    pub tp_by_size: Vec<u32>,
    /// Trie nodes visited across all size classes
    pub visited: usize,
    /// Size classes traversed
    pub size_classes: usize,
}

impl LookupOutcome {
    fn empty(max_prefix_size: usize) -> Self {
        Self {
            fp_by_size: vec![0; max_prefix_size],
            tp_by_size: vec![0; max_prefix_size],
            ..Default::default()
        }
    }

    pub fn total_tp(&self) -> u32 {
        self.tp_by_size.iter().sum()
    }

    pub fn total_fp(&self) -> u32 {
        self.fp_by_size.iter().sum()
    }
}

/// Report row for one size class
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeClassReport {
    pub size: usize,
    pub entries: usize,
    pub fea: f64,
    pub fea_samples: u64,
    pub stats: Statistics,
    pub summary: StatsReport,
}

/// Report row for one forwarding entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryReport {
    pub prefix: String,
    pub size: usize,
    pub summary: StatsReport,
}

/// Snapshot of everything the FIB has accumulated
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FibReport {
    pub max_prefix_size: usize,
    pub total_entries: usize,
    pub size_class_count: usize,
    /// Ascending by size
    pub size_classes: Vec<SizeClassReport>,
    pub overall: StatsReport,
    /// Indexed by `|F| - 1`
    pub fp_by_entry_size: Vec<u32>,
    pub tp_by_entry_size: Vec<u32>,
    pub tn_by_entry_size: Vec<u32>,
    pub total_by_entry_size: Vec<u32>,
    /// Indexed by `|F\R|`
    pub fp_by_distance: Vec<u32>,
    pub all_by_distance: Vec<u32>,
    /// Empty unless per-entry tracking is enabled
    pub entries: Vec<EntryReport>,
}

/// RID forwarding information base
pub struct Fib {
    config: FibConfig,
    encoder: Box<dyn RidEncoder>,
    buckets: BTreeMap<usize, SizeClassBucket>,
    coordinator: Option<LookupCoordinator>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl Fib {
    /// Create a FIB with the Bloom encoder and no metrics
    pub fn new(config: FibConfig) -> Result<Self, FibError> {
        Self::with_metrics(config, Arc::new(NoOpMetrics))
    }

    pub fn with_metrics(
        config: FibConfig,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Result<Self, FibError> {
        let encoder = BloomRidEncoder::new(config.hash_count, config.max_prefix_size);
        Self::with_encoder(config, Box::new(encoder), metrics)
    }

    /// Create a FIB around any [`RidEncoder`]
    pub fn with_encoder(
        config: FibConfig,
        encoder: Box<dyn RidEncoder>,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Result<Self, FibError> {
        config.validate()?;
        if encoder.max_prefix_size() < config.max_prefix_size {
            return Err(FibError::InvalidConfig(format!(
                "encoder handles {} components, config asks for {}",
                encoder.max_prefix_size(),
                config.max_prefix_size
            )));
        }

        let coordinator = if config.parallel_lookup {
            Some(LookupCoordinator::new(config.worker_threads)?)
        } else {
            None
        };

        info!(
            max_prefix_size = config.max_prefix_size,
            worker_threads = config.worker_threads,
            parallel = config.parallel_lookup,
            "FIB created"
        );

        Ok(Self {
            config,
            encoder,
            buckets: BTreeMap::new(),
            coordinator,
            metrics,
        })
    }

    pub fn config(&self) -> &FibConfig {
        &self.config
    }

    pub fn encoder(&self) -> &dyn RidEncoder {
        self.encoder.as_ref()
    }

    pub fn size_class(&self, size: usize) -> Option<&SizeClassBucket> {
        self.buckets.get(&size)
    }

    /// Size classes in ascending size order
    pub fn size_classes(&self) -> impl Iterator<Item = &SizeClassBucket> {
        self.buckets.values()
    }

    pub fn size_class_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn total_entries(&self) -> usize {
        self.buckets.values().map(SizeClassBucket::entries).sum()
    }

    /// Insert an already encoded prefix into the size class `size`
    ///
    /// The size class is created on first use. A RID already present in
    /// that size class is ignored and reported as
    /// [`InsertOutcome::Duplicate`].
    pub fn insert(&mut self, prefix: &str, size: usize, rid: Rid) -> Result<InsertOutcome, FibError> {
        let max = self.config.max_prefix_size;
        if size == 0 {
            return Err(FibError::InvalidPrefix(format!("'{}' has size 0", prefix)));
        }
        if size > max {
            return Err(FibError::EncodingOverflow { size, max });
        }

        let start = Instant::now();
        let track = self.config.track_entry_stats;
        let bucket = self.buckets.entry(size).or_insert_with(|| {
            debug!(size = size, "Creating size class");
            SizeClassBucket::new(size, track)
        });

        let outcome = bucket.insert(Entry::new(rid, size, prefix))?;
        match outcome {
            InsertOutcome::Inserted(node) => {
                self.metrics.record_insert(start.elapsed());
                debug!(prefix = prefix, size = size, node = node.index(), "Inserted entry");
            }
            InsertOutcome::Duplicate(_) => {
                self.metrics.record_duplicate();
                debug!(prefix = prefix, size = size, "Duplicate RID ignored");
            }
        }

        Ok(outcome)
    }

    /// Remove the entry with exactly this RID from size class `size`
    pub fn remove(&mut self, rid: &Rid, size: usize) -> Result<Entry, FibError> {
        let bucket = self
            .buckets
            .get_mut(&size)
            .ok_or(FibError::EntryNotFound)?;

        let removed = bucket.remove(rid)?;
        debug!(prefix = %removed.prefix, size = size, "Removed entry");
        Ok(removed)
    }

    /// Look a request up in every size class `<= request_size`
    ///
    /// Uses the worker pool when parallel lookup is enabled. Without an
    /// eligible size class the result arrays are all zero.
    pub fn lookup(&mut self, request: &Rid, request_name: &str, request_size: usize) -> LookupOutcome {
        let parallel = self.coordinator.is_some();
        self.run_lookup(request, request_name, request_size, parallel)
    }

    /// [`Fib::lookup`] on the calling thread only
    pub fn lookup_sequential(
        &mut self,
        request: &Rid,
        request_name: &str,
        request_size: usize,
    ) -> LookupOutcome {
        self.run_lookup(request, request_name, request_size, false)
    }

    fn run_lookup(
        &mut self,
        request: &Rid,
        request_name: &str,
        request_size: usize,
        parallel: bool,
    ) -> LookupOutcome {
        let start = Instant::now();
        let max = self.config.max_prefix_size;
        let mut outcome = LookupOutcome::empty(max);

        let upper = request_size.min(max);
        let eligible: Vec<&mut SizeClassBucket> = if upper == 0 {
            Vec::new()
        } else {
            self.buckets
                .range_mut(1..=upper)
                .rev()
                .map(|(_, bucket)| bucket)
                .collect()
        };

        if eligible.is_empty() {
            self.metrics.record_no_size_class();
            debug!(
                request = request_name,
                request_size = request_size,
                "No size class for request"
            );
            return outcome;
        }

        outcome.size_classes = eligible.len();
        let results = match (&self.coordinator, parallel) {
            (Some(coordinator), true) => coordinator.dispatch(eligible, request, request_name),
            _ => dispatch_sequential(eligible, request, request_name),
        };

        for result in &results {
            outcome.fp_by_size[result.size - 1] = result.fp;
            outcome.tp_by_size[result.size - 1] = result.tp;
            outcome.visited += result.visited;
        }

        self.metrics.record_lookup(start.elapsed(), outcome.visited);
        debug!(
            request = request_name,
            size_classes = outcome.size_classes,
            visited = outcome.visited,
            tp = outcome.total_tp(),
            fp = outcome.total_fp(),
            "Lookup complete"
        );

        outcome
    }

    /// Tear down every size class, returning the number of nodes released
    pub fn erase(&mut self) -> usize {
        let buckets = std::mem::take(&mut self.buckets);

        let mut released = 0;
        for (size, bucket) in buckets {
            let nodes = bucket.erase();
            debug!(size = size, nodes = nodes, "Released size class");
            released += nodes;
        }

        info!(nodes = released, "FIB erased");
        released
    }

    pub fn report(&self) -> FibReport {
        let max = self.config.max_prefix_size;
        let mut overall = Statistics::new(max);
        let mut fp_by_entry_size = vec![0; max];
        let mut tp_by_entry_size = vec![0; max];
        let mut tn_by_entry_size = vec![0; max];
        let mut total_by_entry_size = vec![0; max];
        let mut size_classes = Vec::with_capacity(self.buckets.len());
        let mut entries = Vec::new();

        for bucket in self.buckets.values() {
            let i = bucket.size - 1;
            fp_by_entry_size[i] = bucket.stats.fp;
            tp_by_entry_size[i] = bucket.stats.tp;
            tn_by_entry_size[i] = bucket.stats.tn;
            total_by_entry_size[i] = bucket.stats.total;
            overall.merge(&bucket.stats);

            size_classes.push(SizeClassReport {
                size: bucket.size,
                entries: bucket.entries,
                fea: bucket.fea,
                fea_samples: bucket.fea_samples,
                stats: bucket.stats.clone(),
                summary: bucket.stats.report(),
            });

            if let Some(map) = &bucket.entry_stats {
                let mut rows: Vec<EntryReport> = map
                    .iter()
                    .map(|(prefix, stats)| EntryReport {
                        prefix: prefix.clone(),
                        size: bucket.size,
                        summary: stats.report(),
                    })
                    .collect();
                rows.sort_by(|a, b| a.prefix.cmp(&b.prefix));
                entries.extend(rows);
            }
        }

        FibReport {
            max_prefix_size: max,
            total_entries: self.total_entries(),
            size_class_count: self.buckets.len(),
            size_classes,
            overall: overall.report(),
            fp_by_entry_size,
            tp_by_entry_size,
            tn_by_entry_size,
            total_by_entry_size,
            fp_by_distance: overall.fp_by_distance,
            all_by_distance: overall.all_by_distance,
            entries,
        }
    }

    fn encode_entry(&self, prefix: &str) -> Result<EncodedPrefix, FibError> {
        self.encoder.encode(prefix).map_err(|e| {
            self.metrics.record_rejected();
            warn!(prefix = prefix, error = %e, "Rejected prefix");
            e
        })
    }
}

impl ForwardingTableApi for Fib {
    fn insert_prefix(&mut self, prefix: &str) -> Result<InsertOutcome, FibError> {
        let encoded = self.encode_entry(prefix)?;
        self.insert(prefix, encoded.size, encoded.rid)
    }

    fn remove_prefix(&mut self, prefix: &str) -> Result<(), FibError> {
        let encoded = self.encoder.encode(prefix)?;
        self.remove(&encoded.rid, encoded.size).map(|_| ())
    }

    fn lookup_request(&mut self, request: &str) -> Result<LookupOutcome, FibError> {
        let encoded = self.encoder.encode(request)?;
        Ok(self.lookup(&encoded.rid, request, encoded.size))
    }

    fn report(&self) -> FibReport {
        Fib::report(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FibMetrics;

    fn fib() -> Fib {
        Fib::new(FibConfig::default().with_worker_threads(2)).unwrap()
    }

    #[test]
    fn test_size_classes_created_lazily() {
        let mut fib = fib();
        assert_eq!(fib.size_class_count(), 0);

        fib.insert_prefix("cmu.edu/cylab").unwrap();
        fib.insert_prefix("cmu.edu/ece").unwrap();
        fib.insert_prefix("pitt.edu").unwrap();

        assert_eq!(fib.size_class_count(), 2);
        assert_eq!(fib.size_class(2).map(SizeClassBucket::entries), Some(2));
        assert_eq!(fib.size_class(1).map(SizeClassBucket::entries), Some(1));
        assert_eq!(fib.total_entries(), 3);
    }

    #[test]
    fn test_duplicate_insert_counted_not_stored() {
        let metrics = Arc::new(FibMetrics::new());
        let mut fib = Fib::with_metrics(FibConfig::default(), metrics.clone()).unwrap();

        assert!(fib.insert_prefix("a.com/b").unwrap().is_inserted());
        assert!(!fib.insert_prefix("a.com/b/").unwrap().is_inserted());

        assert_eq!(fib.total_entries(), 1);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.entries_inserted, 1);
        assert_eq!(snapshot.duplicates_ignored, 1);
    }

    #[test]
    fn test_insert_rejects_bad_sizes() {
        let config = FibConfig {
            max_prefix_size: 3,
            ..FibConfig::default()
        };
        let mut fib = Fib::new(config).unwrap();

        assert!(matches!(
            fib.insert("x", 0, Rid::zero()),
            Err(FibError::InvalidPrefix(_))
        ));
        assert_eq!(
            fib.insert("a/b/c/d", 4, Rid::zero()),
            Err(FibError::EncodingOverflow { size: 4, max: 3 })
        );
        assert!(matches!(
            fib.insert_prefix("a/b/c/d"),
            Err(FibError::EncodingOverflow { .. })
        ));
        assert_eq!(fib.size_class_count(), 0);
    }

    #[test]
    fn test_lookup_without_size_class_is_all_zero() {
        let metrics = Arc::new(FibMetrics::new());
        let mut fib = Fib::with_metrics(FibConfig::default(), metrics.clone()).unwrap();
        fib.insert_prefix("a/b/c").unwrap();

        let outcome = fib.lookup_request("a/b").unwrap();

        assert_eq!(outcome.size_classes, 0);
        assert_eq!(outcome.total_tp() + outcome.total_fp(), 0);
        assert_eq!(outcome.fp_by_size.len(), fib.config().max_prefix_size);
        assert_eq!(metrics.snapshot().lookups_without_size_class, 1);
    }

    #[test]
    fn test_fea_is_incremental_mean() {
        let mut fib = fib();
        for name in ["a/b", "a/c", "q/r", "x/y"] {
            fib.insert_prefix(name).unwrap();
        }

        let encoder = BloomRidEncoder::default();
        let mut samples = Vec::new();
        for request in ["a/b/c", "x/y/z"] {
            let rid = encoder.encode(request).unwrap().rid;
            let trie = fib.size_class(2).map(SizeClassBucket::trie).unwrap();
            let visited = trie.trace(&rid, request).len();
            samples.push(1.0 - visited as f64 / trie.len() as f64);

            fib.lookup(&rid, request, 3);
        }

        let bucket = fib.size_class(2).unwrap();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert_eq!(bucket.fea_samples(), 2);
        assert!((bucket.fea() - mean).abs() < 1e-12);
        assert!((0.0..1.0).contains(&bucket.fea()));
    }

    #[test]
    fn test_remove_prefix() {
        let mut fib = fib();
        fib.insert_prefix("a/b").unwrap();
        fib.insert_prefix("a/c").unwrap();

        fib.remove_prefix("a/b").unwrap();

        assert_eq!(fib.total_entries(), 1);
        assert_eq!(fib.remove_prefix("a/b"), Err(FibError::EntryNotFound));
        assert_eq!(fib.remove_prefix("z"), Err(FibError::EntryNotFound));
        assert!(fib.size_class(2).unwrap().trie().check_invariants());
    }

    #[test]
    fn test_entry_stats_tracked_when_enabled() {
        let config = FibConfig {
            track_entry_stats: true,
            ..FibConfig::default()
        };
        let mut fib = Fib::new(config).unwrap();
        fib.insert_prefix("a/b").unwrap();
        fib.insert_prefix("c/d").unwrap();

        fib.lookup_request("a/b/ph").unwrap();

        let bucket = fib.size_class(2).unwrap();
        assert_eq!(bucket.entry_stats("a/b").map(|s| s.tp), Some(1));

        let report = fib.report();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].prefix, "a/b");
    }

    #[test]
    fn test_entry_stats_off_by_default() {
        let mut fib = fib();
        fib.insert_prefix("a/b").unwrap();
        fib.lookup_request("a/b/ph").unwrap();

        assert!(fib.size_class(2).unwrap().entry_stats("a/b").is_none());
        assert!(fib.report().entries.is_empty());
    }

    #[test]
    fn test_report_aggregates_size_classes() {
        let mut fib = fib();
        fib.insert_prefix("a").unwrap();
        fib.insert_prefix("a/b").unwrap();
        fib.insert_prefix("a/b/c").unwrap();

        let outcome = fib.lookup_request("a/b/c/d").unwrap();
        assert_eq!(outcome.tp_by_size[..3], [1, 1, 1]);

        let report = fib.report();
        assert_eq!(report.total_entries, 3);
        assert_eq!(report.size_class_count, 3);
        assert_eq!(report.tp_by_entry_size[..3], [1, 1, 1]);
        assert_eq!(report.overall.tp, 3);
        assert_eq!(report.overall.total, outcome.visited as u32);
        assert_eq!(report.all_by_distance.iter().sum::<u32>(), report.overall.total);
        assert!(report.size_classes.iter().all(|c| c.stats.is_consistent()));
    }

    #[test]
    fn test_erase_releases_every_node() {
        let mut fib = fib();
        for name in ["a", "b", "a/b", "a/c", "a/b/c"] {
            fib.insert_prefix(name).unwrap();
        }
        let nodes: usize = fib.size_classes().map(|b| b.trie().len()).sum();

        assert_eq!(fib.erase(), nodes);
        assert_eq!(fib.size_class_count(), 0);
        assert_eq!(fib.erase(), 0);
    }
}
