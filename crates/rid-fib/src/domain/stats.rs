//! Lookup statistics
//!
//! Every node a lookup visits is classified as a true positive (the node's
//! RID matches and its name really is a prefix of the request), a false
//! positive (the RID matches only through a Bloom collision) or a true
//! negative. Counters are kept per size class, with histograms over the
//! match distance `|F\R|`.
//!
//! INVARIANTS:
//! - `tp + fp + tn == total`
//! - `sum(fp_by_distance) == fp`, `sum(all_by_distance) == total`

use serde::{Deserialize, Serialize};

/// Outcome of testing one trie node against a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    TruePositive,
    FalsePositive,
    TrueNegative,
}

impl Classification {
    /// `(tp, fp, tn)` contribution of a single visit
    pub fn counts(self) -> (u32, u32, u32) {
        match self {
            Classification::TruePositive => (1, 0, 0),
            Classification::FalsePositive => (0, 1, 0),
            Classification::TrueNegative => (0, 0, 1),
        }
    }

    pub fn is_match(self) -> bool {
        !matches!(self, Classification::TrueNegative)
    }
}

/// TP/FP/TN counters with `|F\R|` histograms
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub tp: u32,
    pub fp: u32,
    pub tn: u32,
    pub total: u32,
    /// FP counts indexed by match distance
    pub fp_by_distance: Vec<u32>,
    /// All classifications indexed by match distance
    pub all_by_distance: Vec<u32>,
}

impl Statistics {
    /// Statistics for entries of `size` components (distances `0..=size`)
    pub fn new(size: usize) -> Self {
        Self {
            fp_by_distance: vec![0; size + 1],
            all_by_distance: vec![0; size + 1],
            ..Default::default()
        }
    }

    /// Accumulate one batch of classifications observed at `distance`
    pub fn record(&mut self, distance: usize, tp: u32, fp: u32, tn: u32, total: u32) {
        if distance >= self.all_by_distance.len() {
            self.fp_by_distance.resize(distance + 1, 0);
            self.all_by_distance.resize(distance + 1, 0);
        }

        if fp > 0 {
            self.fp_by_distance[distance] += fp;
        }
        self.all_by_distance[distance] += total;

        self.tp += tp;
        self.fp += fp;
        self.tn += tn;
        self.total += total;
    }

    /// Accumulate a single node visit
    pub fn record_visit(&mut self, distance: usize, class: Classification) {
        let (tp, fp, tn) = class.counts();
        self.record(distance, tp, fp, tn, 1);
    }

    /// Add another set of counters into this one
    pub fn merge(&mut self, other: &Statistics) {
        let len = self.all_by_distance.len().max(other.all_by_distance.len());
        self.fp_by_distance.resize(len, 0);
        self.all_by_distance.resize(len, 0);

        for (d, v) in other.fp_by_distance.iter().enumerate() {
            self.fp_by_distance[d] += v;
        }
        for (d, v) in other.all_by_distance.iter().enumerate() {
            self.all_by_distance[d] += v;
        }

        self.tp += other.tp;
        self.fp += other.fp;
        self.tn += other.tn;
        self.total += other.total;
    }

    /// Summary counters and FP rate
    pub fn report(&self) -> StatsReport {
        StatsReport {
            tp: self.tp,
            fp: self.fp,
            tn: self.tn,
            total: self.total,
            fp_rate: (self.total > 0).then(|| self.fp as f64 / self.total as f64),
        }
    }

    /// Checks the conservation invariants
    pub fn is_consistent(&self) -> bool {
        self.tp + self.fp + self.tn == self.total
            && self.fp_by_distance.iter().sum::<u32>() == self.fp
            && self.all_by_distance.iter().sum::<u32>() == self.total
    }
}

/// TP/FP/TN summary
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub tp: u32,
    pub fp: u32,
    pub tn: u32,
    pub total: u32,
    /// `fp / total`; `None` before any classification
    pub fp_rate: Option<f64>,
}

/// FP sizes conditioned on the sizes at which a lookup found true positives
///
/// `cells[t][f]` counts FPs of size `f + 1` seen in lookups that produced a
/// TP of size `t + 1`, for `f >= t`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpConditionalMatrix {
    cells: Vec<Vec<u64>>,
}

/// One row of [`TpConditionalMatrix::rows`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpConditionalRow {
    pub tp_size: usize,
    /// FPs with `|F| == |TP|`
    pub fps_equal: u64,
    /// FPs with `|F| > |TP|`
    pub fps_larger: u64,
}

impl TpConditionalMatrix {
    pub fn new(max_size: usize) -> Self {
        Self {
            cells: vec![vec![0; max_size]; max_size],
        }
    }

    pub fn max_size(&self) -> usize {
        self.cells.len()
    }

    /// Fold one lookup's per-size results into the matrix
    pub fn update(&mut self, fp_by_size: &[u32], tp_by_size: &[u32]) {
        let n = self.cells.len();

        for (t, &tps) in tp_by_size.iter().enumerate().take(n) {
            if tps == 0 {
                continue;
            }
            for (f, &fps) in fp_by_size.iter().enumerate().take(n).skip(t) {
                self.cells[t][f] += u64::from(fps);
            }
        }
    }

    pub fn rows(&self) -> Vec<TpConditionalRow> {
        self.cells
            .iter()
            .enumerate()
            .map(|(t, row)| TpConditionalRow {
                tp_size: t + 1,
                fps_equal: row[t],
                fps_larger: row[t + 1..].iter().sum(),
            })
            .collect()
    }
}
