//! Domain Layer - Pure forwarding logic
//!
//! This layer contains:
//! - RID identifiers and containment matching
//! - Bloom hashing and prefix encoding
//! - Patricia trie with TP/FP/TN classification
//! - Statistics store
//! - Size-class directory (FIB) and its parallel lookup
//! - Configuration
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod config;
pub mod encoder;
pub mod fib;
pub mod hash_functions;
pub mod parallel;
pub mod rid;
pub mod stats;
pub mod trie;

pub use config::{FibConfig, FibConfigBuilder};
pub use encoder::{count_components, prefix_distance, BloomRidEncoder, EncodedPrefix};
pub use fib::{
    EntryReport, Fib, FibReport, LookupOutcome, SizeClassBucket, SizeClassOutcome,
    SizeClassReport,
};
pub use parallel::LookupCoordinator;
pub use rid::{Rid, RID_BITS, RID_LEN, RID_TYPE};
pub use stats::{Classification, Statistics, StatsReport, TpConditionalMatrix, TpConditionalRow};
pub use trie::{Entry, InsertOutcome, Link, NodeId, NodeView, Trie, Visit, VisitRecord, ROOT};
