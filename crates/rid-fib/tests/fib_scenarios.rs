//! # FIB Lookup Scenarios
//!
//! End-to-end behaviour of the size-class directory through its public API.
//!
//! ## Test Categories
//!
//! 1. **Classification** - TP / FP / TN on hand-built identifiers
//! 2. **Degenerate FIBs** - no size class, duplicates, overflow
//! 3. **Concurrency** - worker pool vs. sequential lookup
//! 4. **Teardown** - erase and reports

use std::sync::Arc;

use rid_fib::domain::{RID_BITS, RID_LEN};
use rid_fib::{
    Classification, Fib, FibConfig, FibError, FibMetrics, ForwardingTableApi, LookupOutcome, Rid,
    RidEncoder,
};

// =============================================================================
// TEST HELPERS
// =============================================================================

fn rid_with_bits(positions: &[usize]) -> Rid {
    let mut bytes = [0u8; RID_LEN];
    for &p in positions {
        assert!(p < RID_BITS);
        bytes[p / 8] |= 0x80 >> (p % 8);
    }
    Rid::from_bytes(bytes)
}

fn parallel_config() -> FibConfig {
    FibConfig::default().with_worker_threads(3)
}

/// Corpus spread over size classes 1..=3
fn corpus() -> Vec<String> {
    let hosts = ["cmu.edu", "pitt.edu", "xia.net", "ghc.org"];
    let labs = ["cylab", "ece", "cs", "ph"];
    let people = ["r2d2", "c3po", "yt1300"];

    let mut names = Vec::new();
    for host in hosts {
        names.push(host.to_string());
        for lab in labs {
            names.push(format!("{}/{}", host, lab));
            for person in people {
                names.push(format!("{}/{}/{}", host, lab, person));
            }
        }
    }
    names
}

fn requests() -> Vec<String> {
    vec![
        "cmu.edu/cylab/r2d2/9001".to_string(),
        "pitt.edu/cs/c3po".to_string(),
        "xia.net/ph".to_string(),
        "unknown.com/cylab/ph/ghc".to_string(),
        "ghc.org/ece/yt1300/ph".to_string(),
    ]
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

#[test]
fn test_exact_identifier_is_true_positive() {
    let mut fib = Fib::new(parallel_config()).unwrap();
    let a = rid_with_bits(&[1, 20, 33, 90]);
    let b = rid_with_bits(&[0, 5, 64, 120]);
    let c = rid_with_bits(&[2, 7, 101, 150]);

    fib.insert("cmu.edu/cylab", 2, a).unwrap();
    fib.insert("pitt.edu/cs", 2, b).unwrap();
    fib.insert("xia.net/ph", 2, c).unwrap();

    let outcome = fib.lookup(&a, "cmu.edu/cylab/r2d2", 3);

    assert_eq!(outcome.tp_by_size[1], 1);
    assert_eq!(outcome.total_fp(), 0);

    let stats = fib.size_class(2).unwrap().stats();
    assert_eq!(stats.tp, 1);
    assert_eq!(stats.tn + 1, stats.total);
}

#[test]
fn test_matching_identifier_with_foreign_name_is_false_positive() {
    let mut fib = Fib::new(parallel_config()).unwrap();
    let a = rid_with_bits(&[1, 20, 33, 90]);
    let b = rid_with_bits(&[0, 5, 64, 120]);
    let c = rid_with_bits(&[2, 7, 101, 150]);

    fib.insert("cmu.edu/cylab", 2, a).unwrap();
    fib.insert("pitt.edu/cs", 2, b).unwrap();
    fib.insert("xia.net/ph", 2, c).unwrap();

    // carries every bit of b but the name has nothing to do with it
    let request = rid_with_bits(&[0, 5, 64, 120, 140]);
    let outcome = fib.lookup(&request, "ghc.org/ece/ph", 3);

    assert_eq!(outcome.fp_by_size[1], 1);
    assert_eq!(outcome.total_tp(), 0);

    let stats = fib.size_class(2).unwrap().stats();
    assert_eq!(stats.fp, 1);
    assert!(stats.is_consistent());
}

#[test]
fn test_every_hierarchical_prefix_found() {
    let mut fib = Fib::new(parallel_config()).unwrap();
    for name in corpus() {
        fib.insert_prefix(&name).unwrap();
    }

    let outcome = fib.lookup_request("cmu.edu/cylab/r2d2/9001").unwrap();

    // cmu.edu, cmu.edu/cylab, cmu.edu/cylab/r2d2
    assert!(outcome.tp_by_size[..3].iter().all(|&tp| tp == 1));
    assert_eq!(outcome.size_classes, 3);
}

// =============================================================================
// DEGENERATE FIBS
// =============================================================================

#[test]
fn test_empty_fib_lookup_returns_zeros() {
    let mut fib = Fib::new(parallel_config()).unwrap();

    let outcome = fib.lookup_request("cmu.edu/cylab/ph").unwrap();

    assert_eq!(outcome.total_tp() + outcome.total_fp(), 0);
    assert_eq!(outcome.visited, 0);
    assert_eq!(fib.report().overall.total, 0);
    assert_eq!(fib.report().overall.fp_rate, None);
}

#[test]
fn test_duplicate_insert_is_idempotent() {
    let mut fib = Fib::new(parallel_config()).unwrap();
    let rid = rid_with_bits(&[4, 44, 144]);

    assert!(fib.insert("a/b", 2, rid).unwrap().is_inserted());
    let before = fib.size_class(2).unwrap().entries();
    assert!(!fib.insert("a/b", 2, rid).unwrap().is_inserted());

    assert_eq!(fib.size_class(2).unwrap().entries(), before);
    assert_eq!(fib.size_class(2).unwrap().trie().len(), 2);
}

#[test]
fn test_same_identifier_in_two_size_classes() {
    let mut fib = Fib::new(parallel_config()).unwrap();
    let rid = rid_with_bits(&[4, 44, 144]);

    fib.insert("a", 1, rid).unwrap();
    fib.insert("a/b", 2, rid).unwrap();

    assert_eq!(fib.total_entries(), 2);
}

#[test]
fn test_overflowing_prefix_rejected_and_counted() {
    let metrics = Arc::new(FibMetrics::new());
    let config = FibConfig {
        max_prefix_size: 2,
        ..parallel_config()
    };
    let mut fib = Fib::with_metrics(config, metrics.clone()).unwrap();

    let result = fib.insert_prefix("a/b/c");

    assert_eq!(result, Err(FibError::EncodingOverflow { size: 3, max: 2 }));
    assert_eq!(metrics.snapshot().prefixes_rejected, 1);
    assert_eq!(fib.total_entries(), 0);
}

#[test]
fn test_removing_default_entry_unsupported() {
    let mut fib = Fib::new(parallel_config()).unwrap();
    fib.insert("a/b", 2, rid_with_bits(&[9])).unwrap();

    assert!(matches!(
        fib.remove(&Rid::zero(), 2),
        Err(FibError::RemovalUnsupported { .. })
    ));
    assert_eq!(fib.total_entries(), 1);
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[test]
fn test_parallel_lookup_equals_sequential() {
    let mut parallel = Fib::new(parallel_config()).unwrap();
    let mut sequential = Fib::new(parallel_config().sequential()).unwrap();

    for name in corpus() {
        parallel.insert_prefix(&name).unwrap();
        sequential.insert_prefix(&name).unwrap();
    }
    assert_eq!(parallel.size_class_count(), 3);

    for request in requests() {
        let from_pool = parallel.lookup_request(&request).unwrap();
        let from_loop = sequential.lookup_request(&request).unwrap();
        assert_eq!(from_pool, from_loop, "request {}", request);
    }

    assert_eq!(parallel.report(), sequential.report());
}

#[test]
fn test_parallel_lookup_equals_sum_of_single_size_traversals() {
    let mut fib = Fib::new(parallel_config()).unwrap();
    for name in corpus() {
        fib.insert_prefix(&name).unwrap();
    }

    let request = "cmu.edu/ece/c3po/ph";
    let rid = fib.encoder().encode(request).unwrap().rid;

    let mut expected = LookupOutcome {
        fp_by_size: vec![0; fib.config().max_prefix_size],
        tp_by_size: vec![0; fib.config().max_prefix_size],
        visited: 0,
        size_classes: 0,
    };
    for bucket in fib.size_classes() {
        let trace = bucket.trie().trace(&rid, request);
        let count = |class: Classification| trace.iter().filter(|v| v.class == class).count() as u32;
        let i = bucket.size() - 1;
        expected.tp_by_size[i] = count(Classification::TruePositive);
        expected.fp_by_size[i] = count(Classification::FalsePositive);
        expected.visited += trace.len();
        expected.size_classes += 1;
    }

    assert_eq!(fib.lookup(&rid, request, 4), expected);
}

#[test]
fn test_lookup_sequential_matches_pool_on_same_fib() {
    let mut fib = Fib::new(parallel_config()).unwrap();
    for name in corpus() {
        fib.insert_prefix(&name).unwrap();
    }

    let rid = fib.encoder().encode("xia.net/cs/r2d2").unwrap().rid;
    let first = fib.lookup(&rid, "xia.net/cs/r2d2", 3);
    let second = fib.lookup_sequential(&rid, "xia.net/cs/r2d2", 3);

    assert_eq!(first, second);
    assert!(fib.size_classes().all(|b| b.fea_samples() == 2));
}

// =============================================================================
// TEARDOWN & REPORTING
// =============================================================================

#[test]
fn test_report_is_consistent_after_evaluation() {
    let mut fib = Fib::new(parallel_config()).unwrap();
    for name in corpus() {
        fib.insert_prefix(&name).unwrap();
    }
    for request in requests() {
        fib.lookup_request(&request).unwrap();
    }

    let report = fib.report();
    let overall = report.overall;

    assert_eq!(overall.tp + overall.fp + overall.tn, overall.total);
    assert_eq!(report.fp_by_distance.iter().sum::<u32>(), overall.fp);
    assert_eq!(report.all_by_distance.iter().sum::<u32>(), overall.total);
    assert_eq!(report.total_by_entry_size.iter().sum::<u32>(), overall.total);
    assert_eq!(report.total_entries, corpus().len());

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"size_classes\""));
}

#[test]
fn test_erase_releases_all_size_classes() {
    let mut fib = Fib::new(parallel_config()).unwrap();
    for name in corpus() {
        fib.insert_prefix(&name).unwrap();
    }

    // every entry plus one root per size class
    assert_eq!(fib.erase(), corpus().len() + 3);
    assert_eq!(fib.total_entries(), 0);

    let outcome = fib.lookup_request("cmu.edu").unwrap();
    assert_eq!(outcome.size_classes, 0);
}
