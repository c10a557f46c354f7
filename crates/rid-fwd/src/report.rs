//! Evaluation report: console tables, CSV dumps and JSON summary

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rid_fib::domain::TpConditionalRow;
use rid_fib::metrics::TimingSummary;
use rid_fib::{FibReport, MetricsSnapshot, TpConditionalMatrix};
use serde::Serialize;

use crate::corpus::NamespaceStats;

pub const ENTRY_FILE: &str = "entry.dat";
pub const GEN_STATS_FILE: &str = "gen-stats.dat";
pub const REQ_ENTRY_DIFF_FILE: &str = "req-entry-diff.dat";
pub const TP_SIZE_FILE: &str = "tp-size.dat";

const RULE: &str =
    "-------------------------------------------------------------------------------";

/// Everything an evaluation run produced, as written by `--json`
#[derive(Debug, Serialize)]
pub struct EvaluationSummary<'a> {
    pub requests: u64,
    pub namespace: &'a NamespaceStats,
    pub fib: &'a FibReport,
    pub tp_conditional: Vec<TpConditionalRow>,
    pub metrics: &'a MetricsSnapshot,
}

fn seconds(ns: u64) -> f64 {
    ns as f64 / 1e9
}

/// Total/max/min/avg time of one phase
pub fn print_timing(out: &mut impl Write, what: &str, count: u64, timing: &TimingSummary) -> Result<()> {
    writeln!(
        out,
        "{} {}:\n\t[TOT_TIME]: {:.8}\n\t[MAX_TIME]: {:.8}\n\t[MIN_TIME]: {:.8}\n\t[AVG_TIME]: {:.8}",
        count,
        what,
        seconds(timing.total_ns),
        seconds(timing.max_ns),
        seconds(timing.min_ns),
        seconds(timing.avg_ns)
    )?;
    Ok(())
}

pub fn print_namespace(out: &mut impl Write, namespace: &NamespaceStats) -> Result<()> {
    writeln!(out, "\n{}\n{:<12}\t| {:<12}\t\n{}", RULE, "|F|", "# ENTRIES", RULE)?;
    for (size, count) in namespace.rows() {
        writeln!(out, "{:<12}\t| {:<12}\t", size, count)?;
    }
    writeln!(
        out,
        "{}\n{:<12}\t| {:<12}\t\n{}\n{:<12}\t| {:<12}\t\n",
        RULE,
        "TOTAL |F|",
        "TOTAL # ENTRIES",
        RULE,
        namespace.distinct_sizes(),
        namespace.total()
    )?;
    Ok(())
}

/// Size classes, per-|F| counts, per-|F\R| counts and overall FP rate
pub fn print_fib(out: &mut impl Write, report: &FibReport) -> Result<()> {
    writeln!(out, "\n{}\n{:<12}\t| {:<12}\t| {:<12}\n{}", RULE, "|F|", "# ENTRIES", "AVG. FEA", RULE)?;
    for class in &report.size_classes {
        writeln!(out, "{:<12}\t| {:<12}\t| {:.6}", class.size, class.entries, class.fea)?;
    }
    writeln!(
        out,
        "{}\n{:<12}\t| {:<12}\t\n{}\n{:<12}\t| {:<12}\t\n",
        RULE,
        "TOTAL |F|",
        "TOTAL # ENTRIES",
        RULE,
        report.size_class_count,
        report.total_entries
    )?;

    writeln!(
        out,
        "\n{}\n{:<12}\t| {:<12}\t| {:<12}\t| {:<12}\t| {:<12}\t\n{}",
        RULE, "|F|", "# FPs", "# TPs", "# TNs", "# LOOKUPS", RULE
    )?;
    for i in 0..report.max_prefix_size {
        writeln!(
            out,
            "{:<12}\t| {:<12}\t| {:<12}\t| {:<12}\t| {:<12}\t",
            i + 1,
            report.fp_by_entry_size[i],
            report.tp_by_entry_size[i],
            report.tn_by_entry_size[i],
            report.total_by_entry_size[i]
        )?;
    }
    let overall = &report.overall;
    writeln!(
        out,
        "{}\n{:<12}\t| {:<12}\t| {:<12}\t| {:<12}\t| {:<12}\t",
        RULE, "TOTAL", overall.fp, overall.tp, overall.tn, overall.total
    )?;

    writeln!(
        out,
        "\n{}\n{:<20}\t| {:<12}\t| {:<12}\t\n{}",
        RULE, "REQ-ENTRY DIFF. |F\\R|", "# FPs", "# LOOKUPS", RULE
    )?;
    for (d, (fp, all)) in report
        .fp_by_distance
        .iter()
        .zip(&report.all_by_distance)
        .enumerate()
    {
        writeln!(out, "{:<20}\t| {:<12}\t| {:<12}\t", d, fp, all)?;
    }
    writeln!(
        out,
        "{}\n{:<20}\t| {:<12}\t| {:<12}\t\n",
        RULE,
        "TOTAL",
        report.fp_by_distance.iter().sum::<u32>(),
        report.all_by_distance.iter().sum::<u32>()
    )?;

    match overall.fp_rate {
        Some(rate) => writeln!(out, "FP RATE: {:.6} ({} / {})\n", rate, overall.fp, overall.total)?,
        None => writeln!(out, "FP RATE: n/a (no lookups)\n")?,
    }
    Ok(())
}

pub fn print_tp_conditional(out: &mut impl Write, matrix: &TpConditionalMatrix) -> Result<()> {
    writeln!(
        out,
        "\n{}\n{:<8}\t| {:<20}\t| {:<20}\t\n{}",
        RULE, "|TP|", "# FP : |F| = |TP|", "# FP : |F| > |TP|", RULE
    )?;

    let (mut equal, mut larger) = (0, 0);
    for row in matrix.rows() {
        writeln!(out, "{:<8}\t| {:<20}\t| {:<20}\t", row.tp_size, row.fps_equal, row.fps_larger)?;
        equal += row.fps_equal;
        larger += row.fps_larger;
    }

    writeln!(
        out,
        "{}\n{:<8}\t| {:<20}\t| {:<20}\t\n{}\n{:<8}\t| {:<20}\t| {:<20}\t\n",
        RULE,
        "TOTAL |TP|",
        "TOTAL # |F| = |TP|",
        "TOTAL # |F| > |TP|",
        RULE,
        matrix.max_size(),
        equal,
        larger
    )?;
    Ok(())
}

fn create(dir: &Path, name: &str) -> Result<BufWriter<File>> {
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Write `entry.dat`, `gen-stats.dat`, `req-entry-diff.dat` and `tp-size.dat`
pub fn write_csv(dir: &Path, report: &FibReport, matrix: &TpConditionalMatrix) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut out = create(dir, ENTRY_FILE)?;
    for class in &report.size_classes {
        writeln!(out, "{},{},{:.6}", class.size, class.entries, class.fea)?;
    }
    out.flush()?;

    let mut out = create(dir, GEN_STATS_FILE)?;
    for i in 0..report.max_prefix_size {
        writeln!(
            out,
            "{},{},{},{},{}",
            i + 1,
            report.fp_by_entry_size[i],
            report.tp_by_entry_size[i],
            report.tn_by_entry_size[i],
            report.total_by_entry_size[i]
        )?;
    }
    out.flush()?;

    let mut out = create(dir, REQ_ENTRY_DIFF_FILE)?;
    for (d, (fp, all)) in report
        .fp_by_distance
        .iter()
        .zip(&report.all_by_distance)
        .enumerate()
    {
        writeln!(out, "{},{},{}", d, fp, all)?;
    }
    out.flush()?;

    let mut out = create(dir, TP_SIZE_FILE)?;
    for row in matrix.rows() {
        writeln!(out, "{},{},{}", row.tp_size, row.fps_equal, row.fps_larger)?;
    }
    out.flush()?;

    Ok(())
}

pub fn write_json(path: &Path, summary: &EvaluationSummary<'_>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, summary).context("Failed to serialize report")?;
    out.flush()?;
    Ok(())
}
