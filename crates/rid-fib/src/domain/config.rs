//! FIB configuration and validation
//!
//! # Example
//!
//! ```
//! use rid_fib::domain::FibConfigBuilder;
//!
//! let config = FibConfigBuilder::new()
//!     .max_prefix_size(10)
//!     .worker_threads(4)
//!     .build()
//!     .expect("Valid config");
//! assert_eq!(config.max_prefix_size, 10);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::FibError;

use super::encoder::{DEFAULT_HASH_COUNT, MAX_PREFIX_SIZE};
use super::rid::RID_BITS;

/// Upper bound on the worker pool size
pub const MAX_WORKER_THREADS: usize = 256;

/// Forwarding table configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FibConfig {
    /// Largest encodable name size, in components
    pub max_prefix_size: usize,
    /// Bloom hash functions per encoded prefix (k)
    pub hash_count: usize,
    /// Threads in the lookup worker pool
    pub worker_threads: usize,
    /// Fan size classes out to the worker pool; sequential otherwise
    pub parallel_lookup: bool,
    /// Keep TP/FP/TN counters per forwarding entry as well as per size class
    pub track_entry_stats: bool,
}

impl Default for FibConfig {
    fn default() -> Self {
        Self {
            max_prefix_size: MAX_PREFIX_SIZE,
            hash_count: DEFAULT_HASH_COUNT,
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            parallel_lookup: true,
            track_entry_stats: false,
        }
    }
}

impl FibConfig {
    /// Validate configuration bounds
    pub fn validate(&self) -> Result<(), FibError> {
        if self.max_prefix_size == 0 {
            return Err(FibError::InvalidConfig(
                "max_prefix_size cannot be 0".to_string(),
            ));
        }

        if self.hash_count == 0 || self.hash_count > RID_BITS {
            return Err(FibError::InvalidConfig(format!(
                "hash_count must be between 1 and {}",
                RID_BITS
            )));
        }

        if self.worker_threads == 0 || self.worker_threads > MAX_WORKER_THREADS {
            return Err(FibError::InvalidConfig(format!(
                "worker_threads must be between 1 and {}",
                MAX_WORKER_THREADS
            )));
        }

        Ok(())
    }

    /// Builder-style method to set the worker pool size
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Builder-style method to disable the worker pool
    pub fn sequential(mut self) -> Self {
        self.parallel_lookup = false;
        self
    }
}

/// Builder for FibConfig with validation
#[derive(Default)]
pub struct FibConfigBuilder {
    max_prefix_size: Option<usize>,
    hash_count: Option<usize>,
    worker_threads: Option<usize>,
    parallel_lookup: Option<bool>,
    track_entry_stats: Option<bool>,
}

impl FibConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_prefix_size(mut self, size: usize) -> Self {
        self.max_prefix_size = Some(size);
        self
    }

    pub fn hash_count(mut self, k: usize) -> Self {
        self.hash_count = Some(k);
        self
    }

    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn parallel_lookup(mut self, parallel: bool) -> Self {
        self.parallel_lookup = Some(parallel);
        self
    }

    pub fn track_entry_stats(mut self, track: bool) -> Self {
        self.track_entry_stats = Some(track);
        self
    }

    /// Build the FibConfig, validating all parameters
    pub fn build(self) -> Result<FibConfig, FibError> {
        let defaults = FibConfig::default();

        let config = FibConfig {
            max_prefix_size: self.max_prefix_size.unwrap_or(defaults.max_prefix_size),
            hash_count: self.hash_count.unwrap_or(defaults.hash_count),
            worker_threads: self.worker_threads.unwrap_or(defaults.worker_threads),
            parallel_lookup: self.parallel_lookup.unwrap_or(defaults.parallel_lookup),
            track_entry_stats: self.track_entry_stats.unwrap_or(defaults.track_entry_stats),
        };

        config.validate()?;
        Ok(config)
    }
}
