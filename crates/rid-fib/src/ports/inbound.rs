//! Inbound Ports (Driving Ports)
//!
//! The API an evaluation driver uses to build a RID FIB, push requests
//! through it and collect the resulting statistics.

use crate::domain::{FibReport, InsertOutcome, LookupOutcome};
use crate::error::FibError;

/// Primary forwarding table API (Driving Port)
pub trait ForwardingTableApi {
    /// Encode `prefix` and add it as a forwarding entry
    ///
    /// Duplicates within a size class are ignored and reported as
    /// [`InsertOutcome::Duplicate`].
    fn insert_prefix(&mut self, prefix: &str) -> Result<InsertOutcome, FibError>;

    /// Encode `prefix` and remove the matching forwarding entry
    fn remove_prefix(&mut self, prefix: &str) -> Result<(), FibError>;

    /// Encode `request` and look it up in every size class `<=` its size
    ///
    /// # Returns
    /// Per-size TP/FP counts for this request. A FIB without an eligible
    /// size class yields all-zero arrays.
    fn lookup_request(&mut self, request: &str) -> Result<LookupOutcome, FibError>;

    /// Snapshot of accumulated statistics
    fn report(&self) -> FibReport;
}
