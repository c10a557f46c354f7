//! Hash functions for RID encoding
//!
//! Every hierarchical name prefix is mapped to `k` bit positions of the
//! 160-bit RID with MurmurHash3 and double hashing.

use std::io::Cursor;

/// Hash a name prefix with MurmurHash3 (x64, 128-bit), keeping the lower 64 bits
pub fn murmur_hash(element: &[u8], seed: u32) -> u64 {
    let mut cursor = Cursor::new(element);
    // reading from an in-memory cursor cannot fail
    let hash = murmur3::murmur3_x64_128(&mut cursor, seed).unwrap_or(0);
    hash as u64
}

/// Compute `k` bit positions in `[0, m)` for an element
///
/// Uses double hashing: h(i) = h1 + i * h2
pub fn compute_hash_positions(element: &[u8], k: usize, m: usize) -> Vec<usize> {
    let h1 = murmur_hash(element, 0);
    let h2 = murmur_hash(element, 1);

    (0..k)
        .map(|i| {
            let hash = h1.wrapping_add((i as u64).wrapping_mul(h2));
            (hash % m as u64) as usize
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur3_hash_deterministic() {
        let element = b"cmu.edu/cylab";

        assert_eq!(
            murmur_hash(element, 42),
            murmur_hash(element, 42),
            "Same input with same seed must produce same output"
        );
    }

    #[test]
    fn test_murmur3_different_seed_different_output() {
        let element = b"cmu.edu/cylab";

        assert_ne!(murmur_hash(element, 0), murmur_hash(element, 1));
    }

    #[test]
    fn test_positions_within_rid_width() {
        let positions = compute_hash_positions(b"cmu.edu/ece/courses", 7, 160);

        assert_eq!(positions.len(), 7, "Should produce k positions");
        for pos in &positions {
            assert!(*pos < 160, "Position {} should be < 160", pos);
        }
    }

    #[test]
    fn test_hash_uniformity() {
        let m = 160;
        let k = 7;
        let mut counts = vec![0usize; 8]; // 8 buckets of 20 bits

        for i in 0..1000 {
            let element = format!("example.org/p{}", i);
            for pos in compute_hash_positions(element.as_bytes(), k, m) {
                counts[pos / 20] += 1;
            }
        }

        // 7000 positions over 8 buckets, allow 50% variance
        let expected = 7000 / 8;
        for (i, count) in counts.iter().enumerate() {
            assert!(
                *count >= expected / 2 && *count <= expected * 3 / 2,
                "Bucket {} has {} positions, expected ~{}",
                i,
                count,
                expected
            );
        }
    }
}
