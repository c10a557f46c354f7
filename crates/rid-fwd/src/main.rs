//! rid-fwd: RID FIB false-positive evaluation
//!
//! Builds a FIB from a file of URL prefixes (one per line), then replays the
//! same corpus as synthetic requests and reports how often Bloom collisions
//! make a size class answer for a name it does not hold.

mod corpus;
mod report;
mod requests;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use rid_fib::domain::count_components;
use rid_fib::{
    Fib, FibConfig, FibConfigBuilder, FibError, FibMetrics, ForwardingTableApi, TpConditionalMatrix,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::corpus::NamespaceStats;
use crate::report::EvaluationSummary;
use crate::requests::RequestGenerator;

const PROGRESS_EVERY: u64 = 1000;

/// RID FIB false-positive evaluation
#[derive(Parser, Debug)]
#[command(name = "rid-fwd")]
#[command(about = "Build a RID FIB from a URL file and measure lookup false positives")]
struct Args {
    /// File with one URL prefix per line
    #[arg(short, long)]
    file: PathBuf,

    /// Stop reading the corpus after this many lines
    #[arg(long, default_value_t = 1_000_000)]
    max_entries: u64,

    /// Stop evaluating after this many lookups
    #[arg(long, default_value_t = 5000)]
    max_requests: u64,

    /// Components per synthetic request (defaults to the largest prefix size)
    #[arg(long)]
    request_size: Option<usize>,

    /// Seed for request suffixes; runs with the same seed are reproducible
    #[arg(long)]
    seed: Option<u64>,

    /// Lookup worker threads (defaults to available parallelism)
    #[arg(long)]
    threads: Option<usize>,

    /// Look size classes up one after another on the main thread
    #[arg(long)]
    sequential: bool,

    /// Keep per-entry TP/FP/TN counters
    #[arg(long)]
    track_entries: bool,

    /// Directory for entry.dat, gen-stats.dat, req-entry-diff.dat and tp-size.dat
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write the full evaluation summary as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn fib_config(args: &Args) -> Result<FibConfig> {
    let mut builder = FibConfigBuilder::new()
        .parallel_lookup(!args.sequential)
        .track_entry_stats(args.track_entries);
    if let Some(threads) = args.threads {
        builder = builder.worker_threads(threads);
    }
    builder.build().context("Invalid FIB configuration")
}

/// Insert every corpus line, returning the namespace distribution
fn build(fib: &mut Fib, args: &Args) -> Result<NamespaceStats> {
    let max = fib.config().max_prefix_size;
    let mut namespace = NamespaceStats::new(max);
    let (mut read, mut inserted, mut duplicates, mut rejected) = (0u64, 0u64, 0u64, 0u64);

    info!(file = %args.file.display(), max_entries = args.max_entries, "Building FIB");

    for line in corpus::prefixes(&args.file)? {
        if read >= args.max_entries {
            break;
        }
        let prefix = line?;
        read += 1;

        if prefix.is_empty() {
            debug!(line = read, "Skipping empty line");
            continue;
        }

        namespace.record(count_components(&prefix));
        match fib.insert_prefix(&prefix) {
            Ok(outcome) if outcome.is_inserted() => inserted += 1,
            Ok(_) => duplicates += 1,
            Err(FibError::EncodingOverflow { .. } | FibError::InvalidPrefix(_)) => rejected += 1,
            Err(e) => return Err(e).with_context(|| format!("Failed to insert '{}'", prefix)),
        }
    }

    info!(
        lines = read,
        inserted = inserted,
        duplicates = duplicates,
        rejected = rejected,
        largest_prefix = namespace.largest(),
        size_classes = fib.size_class_count(),
        "FIB built"
    );
    Ok(namespace)
}

/// Replay the corpus as requests, returning the number of lookups
fn evaluate(
    fib: &mut Fib,
    args: &Args,
    generator: &mut RequestGenerator,
    matrix: &mut TpConditionalMatrix,
) -> Result<u64> {
    let mut lookups = 0u64;

    info!(
        request_size = generator.request_size(),
        max_requests = args.max_requests,
        "Evaluating"
    );

    for line in corpus::prefixes(&args.file)? {
        if lookups >= args.max_requests {
            break;
        }
        let prefix = line?;
        if prefix.is_empty() {
            continue;
        }

        let Some(request) = generator.generate(&prefix) else {
            debug!(prefix = %prefix, "Prefix longer than request size, skipped");
            continue;
        };

        let outcome = match fib.lookup_request(&request) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(request = %request, error = %e, "Lookup skipped");
                continue;
            }
        };
        matrix.update(&outcome.fp_by_size, &outcome.tp_by_size);
        lookups += 1;

        if lookups % PROGRESS_EVERY == 0 {
            info!(lookups = lookups, "Evaluation progress");
        }
    }

    info!(lookups = lookups, "Evaluation complete");
    Ok(lookups)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    let config = fib_config(&args)?;
    let max = config.max_prefix_size;
    let request_size = args.request_size.unwrap_or(max);
    ensure!(
        (1..=max).contains(&request_size),
        "request size {} must be between 1 and {}",
        request_size,
        max
    );

    let metrics = Arc::new(FibMetrics::new());
    let mut fib = Fib::with_metrics(config, metrics.clone()).context("Failed to create FIB")?;

    let namespace = build(&mut fib, &args)?;
    let built = metrics.snapshot();

    let mut generator = RequestGenerator::new(args.seed, request_size);
    let mut matrix = TpConditionalMatrix::new(max);
    let requests = evaluate(&mut fib, &args, &mut generator, &mut matrix)?;
    let snapshot = metrics.snapshot();

    let fib_report = fib.report();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    report::print_timing(&mut out, "ENTRIES ADDED", built.entries_inserted, &built.insert)?;
    report::print_namespace(&mut out, &namespace)?;
    report::print_timing(&mut out, "LOOKUPS", snapshot.lookups_performed, &snapshot.lookup)?;
    report::print_fib(&mut out, &fib_report)?;
    report::print_tp_conditional(&mut out, &matrix)?;
    out.flush()?;

    if let Some(dir) = &args.output_dir {
        report::write_csv(dir, &fib_report, &matrix)?;
        info!(dir = %dir.display(), "CSV files written");
    }

    if let Some(path) = &args.json {
        let summary = EvaluationSummary {
            requests,
            namespace: &namespace,
            fib: &fib_report,
            tp_conditional: matrix.rows(),
            metrics: &snapshot,
        };
        report::write_json(path, &summary)?;
        info!(path = %path.display(), "JSON summary written");
    }

    fib.erase();
    Ok(())
}
