//! # RID FIB
//!
//! Forwarding information base for Bloom-filter encoded content identifiers
//! (RIDs), with false-positive accounting.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `Rid`: 160-bit identifier with containment matching
//!   - `Trie`: Patricia trie of one prefix size class
//!   - `Fib`: Size-class directory, parallel lookup, FEA
//!   - `Statistics`: TP/FP/TN counters and distance histograms
//!   - `FibConfig` / `FibConfigBuilder`: Configuration with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `ForwardingTableApi`: Driving port, implemented by `Fib`
//!   - `RidEncoder`: Driven port, name → RID encoding
//!
//! ## Matching
//!
//! A request RID `R` matches an entry `F` iff `(R & F) == F`. Several entries
//! can match one request: those whose name really is a prefix of the request
//! are true positives, the rest are Bloom collisions (false positives).
//!
//! ## Invariants
//!
//! - **Round-trip**: every inserted RID is found again by an exact search
//! - **Monotonic key bits**: descending links strictly increase `key_bit`
//! - **Completeness**: `TP + FP + TN == visited` for every traversal
//! - **Pruning**: a right subtree is skipped only when it cannot hold a match
//!
//! ## Usage Example
//!
//! ```
//! use rid_fib::{Fib, FibConfig, ForwardingTableApi};
//!
//! let mut fib = Fib::new(FibConfig::default()).unwrap();
//! fib.insert_prefix("cmu.edu/cylab").unwrap();
//! fib.insert_prefix("cmu.edu/ece").unwrap();
//!
//! let outcome = fib.lookup_request("cmu.edu/cylab/ph").unwrap();
//! assert_eq!(outcome.tp_by_size[1], 1);
//! ```

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;

// Re-exports for convenience
pub use domain::{
    BloomRidEncoder, Classification, Entry, Fib, FibConfig, FibConfigBuilder, FibReport,
    InsertOutcome, LookupOutcome, Rid, Statistics, StatsReport, TpConditionalMatrix, Trie,
};
pub use error::FibError;
pub use metrics::{FibMetrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{ForwardingTableApi, RidEncoder};
