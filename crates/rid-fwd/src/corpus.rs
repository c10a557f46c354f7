//! URL corpus reading and namespace statistics

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Stream the name prefixes of a URL file, one per line
///
/// Line terminators (`\n` and `\r\n`) are stripped; nothing else is.
pub fn prefixes(path: &Path) -> Result<impl Iterator<Item = Result<String>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open URL file {}", path.display()))?;
    let name = path.display().to_string();

    Ok(BufReader::new(file).lines().map(move |line| {
        line.map(|l| l.trim_end_matches('\r').to_string())
            .with_context(|| format!("Failed to read URL file {}", name))
    }))
}

/// Distribution of prefix sizes in the corpus
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceStats {
    /// Prefix count indexed by `size - 1`
    sizes: Vec<u64>,
    largest: usize,
}

impl NamespaceStats {
    pub fn new(max_prefix_size: usize) -> Self {
        Self {
            sizes: vec![0; max_prefix_size],
            largest: 0,
        }
    }

    /// Count a prefix of `size` components; sizes outside `1..=max` are ignored
    pub fn record(&mut self, size: usize) -> bool {
        if size == 0 || size > self.sizes.len() {
            return false;
        }
        self.sizes[size - 1] += 1;
        self.largest = self.largest.max(size);
        true
    }

    /// Largest size seen so far
    pub fn largest(&self) -> usize {
        self.largest
    }

    /// `(size, count)` for every size up to the largest seen
    pub fn rows(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.sizes[..self.largest]
            .iter()
            .enumerate()
            .map(|(i, &count)| (i + 1, count))
    }

    /// Number of sizes with at least one prefix
    pub fn distinct_sizes(&self) -> usize {
        self.sizes.iter().filter(|&&c| c > 0).count()
    }

    pub fn total(&self) -> u64 {
        self.sizes.iter().sum()
    }
}
