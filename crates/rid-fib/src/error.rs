//! Error types for the RID forwarding table

use thiserror::Error;

/// Errors that can occur while building or querying the FIB
///
/// Duplicate insertions and lookups that find no eligible size class are
/// not errors: the first is reported as [`crate::InsertOutcome::Duplicate`],
/// the second yields all-zero result arrays.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FibError {
    #[error("Prefix has too many components: {size} > {max}")]
    EncodingOverflow { size: usize, max: usize },

    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),

    #[error("Removal not supported: {reason}")]
    RemovalUnsupported { reason: &'static str },

    #[error("Entry not found")]
    EntryNotFound,

    #[error("Allocation failed: {what}")]
    AllocationFailure { what: &'static str },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
