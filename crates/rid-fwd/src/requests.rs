//! Request name synthesis
//!
//! A request is built from a corpus prefix by appending random suffixes
//! until it reaches the requested number of components, so every corpus
//! prefix is a true prefix of its own request.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rid_fib::domain::count_components;
use tracing::debug;

/// Components appended to corpus prefixes
pub const SUFFIXES: [&str; 7] = ["/ph", "/ghc", "/cylab", "/9001", "/yt1300", "/r2d2", "/c3po"];

pub struct RequestGenerator {
    rng: StdRng,
    request_size: usize,
}

impl RequestGenerator {
    /// Seeded generators produce the same request sequence on every run
    pub fn new(seed: Option<u64>, request_size: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, request_size }
    }

    pub fn request_size(&self) -> usize {
        self.request_size
    }

    /// Extend `prefix` to `request_size` components
    ///
    /// One trailing `/` is dropped first. Returns `None` when the prefix is
    /// already longer than a request.
    pub fn generate(&mut self, prefix: &str) -> Option<String> {
        let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
        let have = count_components(prefix);

        if have > self.request_size {
            return None;
        }
        if have == self.request_size {
            debug!(prefix = prefix, size = have, "Prefix already at request size");
        }

        let mut name = prefix.to_string();
        for _ in have..self.request_size {
            name.push_str(SUFFIXES[self.rng.gen_range(0..SUFFIXES.len())]);
        }
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_reaches_target_size() {
        let mut generator = RequestGenerator::new(Some(1), 5);
        let request = generator.generate("cmu.edu/cylab/").unwrap();

        assert!(request.starts_with("cmu.edu/cylab/"));
        assert_eq!(count_components(&request), 5);
    }

    #[test]
    fn test_long_prefix_skipped() {
        let mut generator = RequestGenerator::new(Some(1), 2);

        assert_eq!(generator.generate("a/b/c"), None);
        assert_eq!(generator.generate("a/b").as_deref(), Some("a/b"));
    }

    #[test]
    fn test_seeded_generators_agree() {
        let mut a = RequestGenerator::new(Some(42), 8);
        let mut b = RequestGenerator::new(Some(42), 8);

        for prefix in ["x.org", "y.org/ph", "z.org/a/b"] {
            assert_eq!(a.generate(prefix), b.generate(prefix));
        }
    }
}
