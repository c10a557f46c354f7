//! # RID FIB Benchmarks
//!
//! Build and lookup cost of the size-class directory over a synthetic
//! corpus of hierarchical names.
//!
//! ```bash
//! cargo bench --package rid-fib --bench fib_lookup
//! cargo bench --package rid-fib --bench fib_lookup -- rid-fib/lookup
//! ```

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rid_fib::{Fib, FibConfig, ForwardingTableApi};

const SUFFIXES: [&str; 7] = ["ph", "ghc", "cylab", "9001", "yt1300", "r2d2", "c3po"];

/// Names of 1..=4 components under `count / 8` hosts
fn generate_names(count: usize, rng: &mut StdRng) -> Vec<String> {
    let hosts = (count / 8).max(1);
    (0..count)
        .map(|_| {
            let mut name = format!("host{}.net", rng.gen_range(0..hosts));
            for _ in 0..rng.gen_range(0..4) {
                name.push('/');
                name.push_str(SUFFIXES[rng.gen_range(0..SUFFIXES.len())]);
            }
            name
        })
        .collect()
}

fn generate_requests(names: &[String], count: usize, rng: &mut StdRng) -> Vec<String> {
    (0..count)
        .map(|_| {
            let mut request = names[rng.gen_range(0..names.len())].clone();
            while request.split('/').count() < 6 {
                request.push('/');
                request.push_str(SUFFIXES[rng.gen_range(0..SUFFIXES.len())]);
            }
            request
        })
        .collect()
}

fn build_fib(config: FibConfig, names: &[String]) -> Fib {
    let mut fib = Fib::new(config).expect("valid config");
    for name in names {
        fib.insert_prefix(name).expect("encodable name");
    }
    fib
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("rid-fib/insert");
    group.measurement_time(Duration::from_secs(10));

    for count in [1_000, 10_000, 50_000] {
        let mut rng = StdRng::seed_from_u64(7);
        let names = generate_names(count, &mut rng);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("build", count), &names, |b, names| {
            b.iter(|| black_box(build_fib(FibConfig::default().sequential(), names)))
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("rid-fib/lookup");
    group.measurement_time(Duration::from_secs(10));

    for count in [1_000, 10_000, 50_000] {
        let mut rng = StdRng::seed_from_u64(11);
        let names = generate_names(count, &mut rng);
        let requests = generate_requests(&names, 256, &mut rng);

        for (label, config) in [
            ("sequential", FibConfig::default().sequential()),
            ("pool", FibConfig::default()),
        ] {
            let mut fib = build_fib(config, &names);
            let mut i = 0;

            group.bench_function(BenchmarkId::new(label, count), |b| {
                b.iter(|| {
                    i = (i + 1) % requests.len();
                    black_box(fib.lookup_request(&requests[i]))
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup);
criterion_main!(benches);
