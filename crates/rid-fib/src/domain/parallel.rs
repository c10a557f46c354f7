//! # Parallel Size-Class Lookup
//!
//! One request is looked up in every size class `<=` its own size, and the
//! size classes are independent: each owns its trie and its counters.
//!
//! ## Solution: Fan-Out / Join
//!
//! 1. Select: collect `&mut` handles to the eligible buckets (disjoint borrows)
//! 2. Map (Parallel): one traversal job per bucket on a long-lived rayon pool
//! 3. Join: `collect` waits for every job; results come back per size class
//!
//! Each job only touches its own bucket, so no locking is needed and the
//! caller writes the per-size result slots after the join.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::FibError;

use super::fib::{SizeClassBucket, SizeClassOutcome};
use super::rid::Rid;

/// Fixed-size worker pool shared by all lookups of a FIB
pub struct LookupCoordinator {
    pool: ThreadPool,
}

impl LookupCoordinator {
    /// Start a pool with `threads` workers
    pub fn new(threads: usize) -> Result<Self, FibError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("rid-fib-lookup-{}", i))
            .build()
            .map_err(|e| FibError::WorkerPool(e.to_string()))?;

        debug!(threads = threads, "Lookup worker pool started");
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run one traversal per bucket on the pool and wait for all of them
    ///
    /// Jobs beyond the pool size queue until a worker is free. Outcomes keep
    /// the order of `buckets`.
    pub fn dispatch(
        &self,
        buckets: Vec<&mut SizeClassBucket>,
        request: &Rid,
        request_name: &str,
    ) -> Vec<SizeClassOutcome> {
        self.pool.install(|| {
            buckets
                .into_par_iter()
                .map(|bucket| bucket.lookup(request, request_name))
                .collect()
        })
    }
}

/// Sequential counterpart of [`LookupCoordinator::dispatch`]
pub fn dispatch_sequential(
    buckets: Vec<&mut SizeClassBucket>,
    request: &Rid,
    request_name: &str,
) -> Vec<SizeClassOutcome> {
    buckets
        .into_iter()
        .map(|bucket| bucket.lookup(request, request_name))
        .collect()
}
