//! Name prefix → RID encoding
//!
//! A name such as `cmu.edu/cylab/ph` is encoded by inserting every
//! hierarchical prefix (`cmu.edu`, `cmu.edu/cylab`, `cmu.edu/cylab/ph`) into
//! a 160-bit Bloom filter. A request therefore contains the RID of every
//! forwarding entry that is one of its prefixes, plus whatever the filter
//! collides with.

use crate::error::FibError;
use crate::ports::RidEncoder;

use super::hash_functions::compute_hash_positions;
use super::rid::{Rid, RID_BITS};

/// Component delimiter in names
pub const PREFIX_DELIM: char = '/';

/// Default number of hash functions per encoded prefix
pub const DEFAULT_HASH_COUNT: usize = 7;

/// Default maximum number of components in an encodable name
pub const MAX_PREFIX_SIZE: usize = 15;

/// A name encoded as a RID, with its component count
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodedPrefix {
    pub rid: Rid,
    pub size: usize,
}

/// Non-empty components of a name
pub fn components(name: &str) -> impl Iterator<Item = &str> {
    name.split(PREFIX_DELIM).filter(|c| !c.is_empty())
}

/// Number of components of a name
pub fn count_components(name: &str) -> usize {
    components(name).count()
}

/// `|F\R|`: how many of the entry's hierarchical prefixes the request lacks
///
/// The result is in `0..=entry_size`. An entry whose components are all
/// leading components of the request has distance 0.
pub fn prefix_distance(request: &str, entry: &str, entry_size: usize) -> usize {
    let shared = components(entry)
        .zip(components(request))
        .take_while(|(e, r)| e == r)
        .count();

    entry_size.saturating_sub(shared)
}

/// Bloom-filter encoder over the 160-bit RID space
#[derive(Clone, Debug)]
pub struct BloomRidEncoder {
    hash_count: usize,
    max_prefix_size: usize,
}

impl BloomRidEncoder {
    pub fn new(hash_count: usize, max_prefix_size: usize) -> Self {
        Self {
            hash_count,
            max_prefix_size,
        }
    }

    pub fn hash_count(&self) -> usize {
        self.hash_count
    }
}

impl Default for BloomRidEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_COUNT, MAX_PREFIX_SIZE)
    }
}

impl RidEncoder for BloomRidEncoder {
    fn encode(&self, name: &str) -> Result<EncodedPrefix, FibError> {
        let mut rid = Rid::zero();
        let mut prefix = String::with_capacity(name.len());
        let mut size = 0;

        for component in components(name) {
            size += 1;
            if size > self.max_prefix_size {
                return Err(FibError::EncodingOverflow {
                    size: count_components(name),
                    max: self.max_prefix_size,
                });
            }

            if !prefix.is_empty() {
                prefix.push(PREFIX_DELIM);
            }
            prefix.push_str(component);

            for pos in compute_hash_positions(prefix.as_bytes(), self.hash_count, RID_BITS) {
                rid.set_bit(pos);
            }
        }

        if size == 0 {
            return Err(FibError::InvalidPrefix(format!(
                "'{}' has no name components",
                name
            )));
        }

        Ok(EncodedPrefix { rid, size })
    }

    fn max_prefix_size(&self) -> usize {
        self.max_prefix_size
    }
}
