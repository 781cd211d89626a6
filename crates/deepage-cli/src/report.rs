//! Run artefacts: `last-run.json`, `last-run.md`, the README results block
//! and the terminal summary.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use deepage_core::consistency::ConsistencyReport;
use deepage_core::driver::{Comparison, IndexBenchmarkResult, RunInfo};
use deepage_core::metrics::LatencySummary;

use crate::config::Config;

pub const RESULTS_START: &str = "<!-- BENCHMARK_RESULTS_START -->";
pub const RESULTS_END: &str = "<!-- BENCHMARK_RESULTS_END -->";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config: Config,
    pub indexes: Vec<IndexBenchmarkResult>,
    pub cross_index_consistency: ConsistencyReport,
}

impl BenchmarkReport {
    pub fn new(run_info: &RunInfo, config: &Config, comparison: Comparison) -> Self {
        Self {
            run_id: run_info.run_id.clone(),
            started_at: run_info.started_at,
            finished_at: Utc::now(),
            config: config.clone(),
            indexes: comparison.indexes,
            cross_index_consistency: comparison.cross_index_consistency,
        }
    }
}

fn triple(l: &LatencySummary) -> String {
    format!("{} / {} / {}", l.p50, l.p95, l.p99)
}

/// Markdown section shared by `last-run.md` and the README block.
pub fn markdown(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    let c = &report.cross_index_consistency;
    let bench = &report.config.bench;

    let _ = writeln!(out, "### Latest Benchmark Run");
    let _ = writeln!(out, "- **Run ID:** {}", report.run_id);
    let _ = writeln!(out, "- **Timestamp (UTC):** {}", report.finished_at.to_rfc3339());
    let _ = writeln!(out, "- **Server URL:** {}", report.config.http.base_url);
    let _ = writeln!(out, "- **Iterations per index:** {}", bench.iterations);
    let _ = writeln!(out, "- **Search queries per index:** {}", bench.search_queries);
    let _ = writeln!(
        out,
        "- **Total writes:** {}",
        bench.iterations * report.indexes.len()
    );
    let _ = writeln!(out);

    if let [a, b] = report.indexes.as_slice() {
        let (qa, qb) = (&a.searches.quality, &b.searches.quality);
        let (da, db) = (&a.depth_metrics, &b.depth_metrics);
        let rows: [(&str, String, String); 11] = [
            (
                "Write success rate",
                format!("{}%", a.writes.success_rate),
                format!("{}%", b.writes.success_rate),
            ),
            (
                "Read exact-content match",
                format!("{}%", a.reads.exact_content_match_rate),
                format!("{}%", b.reads.exact_content_match_rate),
            ),
            (
                "Search non-empty rate",
                format!("{}%", qa.non_empty_rate),
                format!("{}%", qb.non_empty_rate),
            ),
            (
                "Top-1 accuracy",
                format!("{}%", qa.top1_accuracy),
                format!("{}%", qb.top1_accuracy),
            ),
            (
                "Top-5 hit rate",
                format!("{}%", qa.top5_hit_rate),
                format!("{}%", qb.top5_hit_rate),
            ),
            (
                "Precision@5",
                format!("{}%", qa.precision_at5),
                format!("{}%", qb.precision_at5),
            ),
            ("MRR", format!("{}%", qa.mrr), format!("{}%", qb.mrr)),
            (
                "Context Top-1 (movie/book actor/author/topic)",
                format!("{}%", qa.contextual_top1_accuracy),
                format!("{}%", qb.contextual_top1_accuracy),
            ),
            (
                "Context Top-5 hit (movie/book actor/author/topic)",
                format!("{}%", qa.contextual_top5_hit_rate),
                format!("{}%", qb.contextual_top5_hit_rate),
            ),
            (
                "Avg Top-1 depth",
                da.avg_top1_depth.to_string(),
                db.avg_top1_depth.to_string(),
            ),
            (
                "Top-1 within requested depth",
                format!("{}%", da.top1_within_query_depth_rate),
                format!("{}%", db.top1_within_query_depth_rate),
            ),
        ];

        let _ = writeln!(out, "#### Per-Index Performance");
        let _ = writeln!(out, "| Metric | {} | {} |", a.index_id, b.index_id);
        let _ = writeln!(out, "|---|---:|---:|");
        for (label, va, vb) in &rows {
            let _ = writeln!(out, "| {label} | {va} | {vb} |");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "#### Latency (ms)");
        let _ = writeln!(
            out,
            "| Operation | {} p50 / p95 / p99 | {} p50 / p95 / p99 |",
            a.index_id, b.index_id
        );
        let _ = writeln!(out, "|---|---:|---:|");
        let latencies = [
            ("Write", &a.writes.latency_ms, &b.writes.latency_ms),
            ("Read", &a.reads.operations.latency_ms, &b.reads.operations.latency_ms),
            ("Search", &a.searches.operations.latency_ms, &b.searches.operations.latency_ms),
        ];
        for (label, la, lb) in latencies {
            let _ = writeln!(out, "| {label} | {} | {} |", triple(la), triple(lb));
        }
        let _ = writeln!(out);
    }

    let d = &c.metric_deltas;
    let _ = writeln!(out, "#### Cross-Index Consistency");
    let _ = writeln!(out, "- **Consistency score:** {}/100", c.consistency_score);
    let _ = writeln!(
        out,
        "- **Average top-topic Jaccard (paired queries):** {}% over {} query pairs",
        c.avg_query_topical_jaccard, c.paired_queries
    );
    let _ = writeln!(out, "- **Top-1 accuracy delta:** {}%", d.top1_accuracy_delta);
    let _ = writeln!(out, "- **Top-5 hit rate delta:** {}%", d.top5_hit_rate_delta);
    let _ = writeln!(out, "- **Precision@5 delta:** {}%", d.precision_at5_delta);
    let _ = writeln!(out, "- **MRR delta:** {}%", d.mrr_delta);
    let _ = writeln!(out, "- **Write success delta:** {}%", d.write_success_rate_delta);
    let _ = writeln!(out, "- **Read exact-match delta:** {}%", d.read_match_rate_delta);
    out
}

/// Replace the first marker-delimited block, or append one if the markers
/// are missing.
pub fn splice_readme(current: &str, section: &str) -> String {
    let block = format!("{RESULTS_START}\n{section}\n{RESULTS_END}");

    if let Some(start) = current.find(RESULTS_START) {
        if let Some(rel_end) = current[start..].find(RESULTS_END) {
            let end = start + rel_end + RESULTS_END.len();
            return format!("{}{}{}", &current[..start], block, &current[end..]);
        }
    }

    let head = current.trim_end();
    if head.is_empty() {
        format!("{block}\n")
    } else {
        format!("{head}\n\n{block}\n")
    }
}

pub fn update_readme(path: &Path, section: &str) -> Result<()> {
    let current = if path.exists() {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    } else {
        String::new()
    };
    std::fs::write(path, splice_readme(&current, section))
        .with_context(|| format!("writing {}", path.display()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReports {
    pub json: PathBuf,
    pub markdown: PathBuf,
    pub readme: Option<PathBuf>,
}

/// Write the JSON and Markdown artefacts, and the README block unless
/// `update_readme` is off.
pub fn write_reports(
    report: &BenchmarkReport,
    results_dir: &Path,
    readme: Option<&Path>,
) -> Result<WrittenReports> {
    std::fs::create_dir_all(results_dir)
        .with_context(|| format!("creating {}", results_dir.display()))?;

    let json_path = results_dir.join("last-run.json");
    let json = serde_json::to_string_pretty(report).context("serializing report")?;
    std::fs::write(&json_path, format!("{json}\n"))
        .with_context(|| format!("writing {}", json_path.display()))?;

    let section = markdown(report);
    let md_path = results_dir.join("last-run.md");
    std::fs::write(&md_path, format!("{section}\n"))
        .with_context(|| format!("writing {}", md_path.display()))?;

    if let Some(path) = readme {
        update_readme(path, &section)?;
    }

    Ok(WrittenReports {
        json: json_path,
        markdown: md_path,
        readme: readme.map(Path::to_path_buf),
    })
}

fn print_row(label: &str, a: String, b: String) {
    println!("{:<28} {:>14} {:>14}", label, a, b);
}

/// Compact side-by-side summary for the terminal.
pub fn print_summary(report: &BenchmarkReport) {
    let [a, b] = report.indexes.as_slice() else {
        return;
    };
    println!("deepage benchmark {}", report.run_id);
    println!("{}", "─".repeat(58));
    print_row("", a.index_label.clone(), b.index_label.clone());
    print_row(
        "Write success %",
        a.writes.success_rate.to_string(),
        b.writes.success_rate.to_string(),
    );
    print_row(
        "Read exact match %",
        a.reads.exact_content_match_rate.to_string(),
        b.reads.exact_content_match_rate.to_string(),
    );
    print_row(
        "Top-1 accuracy %",
        a.searches.quality.top1_accuracy.to_string(),
        b.searches.quality.top1_accuracy.to_string(),
    );
    print_row(
        "Top-5 hit %",
        a.searches.quality.top5_hit_rate.to_string(),
        b.searches.quality.top5_hit_rate.to_string(),
    );
    print_row(
        "MRR %",
        a.searches.quality.mrr.to_string(),
        b.searches.quality.mrr.to_string(),
    );
    print_row(
        "Search p95 (ms)",
        a.searches.operations.latency_ms.p95.to_string(),
        b.searches.operations.latency_ms.p95.to_string(),
    );
    println!("{}", "─".repeat(58));
    println!(
        "Consistency score: {}/100",
        report.cross_index_consistency.consistency_score
    );
}
