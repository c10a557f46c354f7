//! RID: Bloom-filter encoded content identifier
//!
//! A RID is a 160-bit vector (the XIA XID width) with a type tag. Bits are
//! numbered from 0 starting at the most significant bit of the first byte.
//!
//! Matching is containment, not equality: a request `R` matches a
//! forwarding entry `F` iff every bit set in `F` is also set in `R`,
//! i.e. `(R & F) == F`.

use std::fmt;

use bitvec::prelude::*;

/// Identifier width in bytes
pub const RID_LEN: usize = 20;

/// Identifier width in bits
pub const RID_BITS: usize = RID_LEN * 8;

/// XIA type tag for RIDs
pub const RID_TYPE: u32 = 0x50;

/// 160-bit content identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    kind: u32,
    bits: BitArray<[u8; RID_LEN], Msb0>,
}

impl Rid {
    /// The all-zero RID held by every trie root (the default route)
    pub fn zero() -> Self {
        Self::from_bytes([0u8; RID_LEN])
    }

    pub fn from_bytes(bytes: [u8; RID_LEN]) -> Self {
        Self {
            kind: RID_TYPE,
            bits: BitArray::new(bytes),
        }
    }

    pub fn kind(&self) -> u32 {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }

    /// Value of bit `i`; positions past the RID width read as 0
    #[inline]
    pub fn bit(&self, i: usize) -> bool {
        i < RID_BITS && self.bits[i]
    }

    pub(crate) fn set_bit(&mut self, i: usize) {
        self.bits.set(i, true);
    }

    /// Number of bits set
    pub fn hamming_weight(&self) -> u32 {
        self.bits.count_ones() as u32
    }

    /// Full-width containment test `(self & entry) == entry`
    pub fn contains(&self, entry: &Rid) -> bool {
        self.as_bytes()
            .iter()
            .zip(entry.as_bytes())
            .all(|(r, f)| r & f == *f)
    }

    /// Containment restricted to the `n` most significant bits
    pub fn contains_masked(&self, entry: &Rid, n: usize) -> bool {
        let n = n.min(RID_BITS);
        let full = n / 8;
        let rest = n % 8;

        let r = self.as_bytes();
        let f = entry.as_bytes();

        if !r[..full].iter().zip(&f[..full]).all(|(r, f)| r & f == *f) {
            return false;
        }

        if rest == 0 {
            return true;
        }

        let mask = 0xFFu8 << (8 - rest);
        r[full] & f[full] & mask == f[full] & mask
    }

    /// First bit position in `1..RID_BITS - 1` where the two RIDs differ
    ///
    /// Bit 0 is never reported: it is the root's decision bit. When no bit
    /// in the window differs, `RID_BITS - 1` is returned.
    pub fn first_differing_bit(&self, other: &Rid) -> usize {
        (1..RID_BITS - 1)
            .find(|&i| self.bit(i) != other.bit(i))
            .unwrap_or(RID_BITS - 1)
    }

    /// Hex of the bytes that hold the `n` leading bits
    pub fn prefix_hex(&self, n: usize) -> String {
        let bytes = n.min(RID_BITS).div_ceil(8).max(1);
        hex::encode(&self.as_bytes()[..bytes])
    }
}

impl Default for Rid {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}

impl fmt::Debug for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rid({:#04x}:{})", self.kind, hex::encode(self.as_bytes()))
    }
}
