//! Outbound Ports (Driven Ports)
//!
//! The FIB only needs two things from an identifier scheme: a way to turn a
//! textual name into a fixed-width RID with its component count, and the
//! largest component count the scheme can encode.

use crate::domain::EncodedPrefix;
use crate::error::FibError;

/// Name → RID encoder (Driven Port)
pub trait RidEncoder: Send + Sync {
    /// Encode a name into a RID and its size (number of components)
    ///
    /// # Errors
    /// - `EncodingOverflow` if the name has more than `max_prefix_size()` components
    /// - `InvalidPrefix` if the name has no components
    fn encode(&self, name: &str) -> Result<EncodedPrefix, FibError>;

    /// Largest encodable size
    fn max_prefix_size(&self) -> usize;
}
