//! Latency distributions and retrieval-quality metrics.
//!
//! Per-operation outcomes are folded into explicit tallies ([`WriteTally`],
//! [`SearchTally`]); the summaries are derived from a finished tally. Every
//! percentage is computed against a non-zero denominator and lands in
//! `[0, 100]`, so degenerate runs report zeros, never NaN.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::{infer_topic_id, Topic};
use crate::service::SearchHit;
use crate::synth::QuerySpec;

/// Result depth considered for rank metrics.
pub const TOP_K: usize = 5;

pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// `num / den` as a percentage, `0` when `den` is zero.
pub fn percentage(num: f64, den: f64) -> f64 {
    if den <= 0.0 {
        return 0.0;
    }
    round3((num / den * 100.0).clamp(0.0, 100.0))
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round3(sum / count as f64)
    }
}

/// Nearest-rank percentile on a sorted copy: `idx = ceil(p/100·n) − 1`,
/// clamped to the sample. Empty input yields `0`.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as i64 - 1;
    let idx = rank.clamp(0, sorted.len() as i64 - 1) as usize;
    sorted[idx]
}

// ---------------------------------------------------------------------------
// Operation summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub min: f64,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

impl LatencySummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = samples.iter().sum::<f64>() / samples.len() as f64;
        Self {
            min: round3(min),
            avg: round3(avg),
            p50: round3(percentile(samples, 50.0)),
            p95: round3(percentile(samples, 95.0)),
            p99: round3(percentile(samples, 99.0)),
            max: round3(max),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSummary {
    pub count: usize,
    pub success: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub throughput_per_sec: f64,
    pub latency_ms: LatencySummary,
}

impl OperationSummary {
    pub fn new(success: usize, failed: usize, latencies: &[f64], duration_ms: f64) -> Self {
        let count = success + failed;
        let throughput_per_sec = if duration_ms <= 0.0 {
            0.0
        } else {
            round3(count as f64 * 1000.0 / duration_ms)
        };
        Self {
            count,
            success,
            failed,
            success_rate: percentage(success as f64, count as f64),
            throughput_per_sec,
            latency_ms: LatencySummary::from_samples(latencies),
        }
    }
}

// ---------------------------------------------------------------------------
// Write / read-back stage
// ---------------------------------------------------------------------------

/// Outcome of one write followed by its read-back.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    WriteFailed,
    ReadFailed { write_ms: f64 },
    Completed {
        write_ms: f64,
        read_ms: f64,
        exact_match: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteTally {
    pub write_success: usize,
    pub write_failed: usize,
    pub read_success: usize,
    pub read_failed: usize,
    pub read_matches: usize,
    pub write_latencies: Vec<f64>,
    pub read_latencies: Vec<f64>,
}

impl WriteTally {
    pub fn absorb(mut self, outcome: &WriteOutcome) -> Self {
        match *outcome {
            WriteOutcome::WriteFailed => self.write_failed += 1,
            WriteOutcome::ReadFailed { write_ms } => {
                self.write_success += 1;
                self.write_latencies.push(write_ms);
                self.read_failed += 1;
            }
            WriteOutcome::Completed {
                write_ms,
                read_ms,
                exact_match,
            } => {
                self.write_success += 1;
                self.write_latencies.push(write_ms);
                self.read_success += 1;
                self.read_latencies.push(read_ms);
                if exact_match {
                    self.read_matches += 1;
                }
            }
        }
        self
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.write_success += other.write_success;
        self.write_failed += other.write_failed;
        self.read_success += other.read_success;
        self.read_failed += other.read_failed;
        self.read_matches += other.read_matches;
        self.write_latencies.extend(other.write_latencies);
        self.read_latencies.extend(other.read_latencies);
        self
    }

    pub fn writes(&self, duration_ms: f64) -> OperationSummary {
        OperationSummary::new(
            self.write_success,
            self.write_failed,
            &self.write_latencies,
            duration_ms,
        )
    }

    pub fn reads(&self, duration_ms: f64) -> ReadSummary {
        ReadSummary {
            operations: OperationSummary::new(
                self.read_success,
                self.read_failed,
                &self.read_latencies,
                duration_ms,
            ),
            exact_content_match_rate: percentage(
                self.read_matches as f64,
                self.read_success as f64,
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadSummary {
    #[serde(flatten)]
    pub operations: OperationSummary,
    pub exact_content_match_rate: f64,
}

// ---------------------------------------------------------------------------
// Search stage
// ---------------------------------------------------------------------------

/// A hit is relevant when it carries every expected marker, or when it
/// carries the query's topic marker.
pub fn is_relevant(content_lower: &str, expected_markers: &[String], topic_marker: &str) -> bool {
    let all_markers = !expected_markers.is_empty()
        && expected_markers
            .iter()
            .all(|m| content_lower.contains(&m.to_lowercase()));
    all_markers || content_lower.contains(topic_marker)
}

/// Relevance judgement for one search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutcome {
    /// 1-based rank of the first relevant hit in the top 5, `0` if none.
    pub first_relevant_rank: usize,
    pub relevant_in_top5: usize,
    pub non_empty: bool,
    pub contextual: bool,
    pub query_depth: u32,
    pub top1_depth: Option<f64>,
    pub relevant_depths: Vec<f64>,
    pub inferred_topics: BTreeSet<String>,
}

impl QueryOutcome {
    pub fn reciprocal_rank(&self) -> f64 {
        if self.first_relevant_rank == 0 {
            0.0
        } else {
            1.0 / self.first_relevant_rank as f64
        }
    }

    pub fn precision_at_k(&self) -> f64 {
        self.relevant_in_top5 as f64 / TOP_K as f64
    }
}

pub fn score_hits(
    hits: &[SearchHit],
    spec: &QuerySpec,
    expected_topic: &Topic,
    query_depth: u32,
) -> QueryOutcome {
    let topic_marker = expected_topic.marker();
    let mut outcome = QueryOutcome {
        non_empty: !hits.is_empty(),
        contextual: spec.kind.is_contextual(),
        query_depth,
        top1_depth: hits.first().and_then(|h| h.depth),
        ..QueryOutcome::default()
    };

    for (i, hit) in hits.iter().take(TOP_K).enumerate() {
        let lower = hit.content.to_lowercase();
        outcome.inferred_topics.insert(infer_topic_id(&lower).to_string());

        if is_relevant(&lower, &spec.expected_markers, &topic_marker) {
            outcome.relevant_in_top5 += 1;
            if outcome.first_relevant_rank == 0 {
                outcome.first_relevant_rank = i + 1;
            }
            if let Some(depth) = hit.depth {
                outcome.relevant_depths.push(depth);
            }
        }
    }
    outcome
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Scored { outcome: QueryOutcome, elapsed_ms: f64 },
    Failed { contextual: bool },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchTally {
    pub succeeded: usize,
    pub failed: usize,
    pub non_empty: usize,
    pub top1_correct: usize,
    pub top5_hit: usize,
    pub precision_sum: f64,
    pub reciprocal_rank_sum: f64,
    pub contextual_queries: usize,
    pub contextual_top1: usize,
    pub contextual_top5: usize,
    pub top1_depth_sum: f64,
    pub top1_depth_count: usize,
    pub top1_within_depth: usize,
    pub relevant_depth_sum: f64,
    pub relevant_depth_count: usize,
    pub latencies: Vec<f64>,
}

impl SearchTally {
    pub fn absorb(mut self, outcome: &SearchOutcome) -> Self {
        let (q, elapsed_ms) = match outcome {
            SearchOutcome::Failed { contextual } => {
                self.failed += 1;
                if *contextual {
                    self.contextual_queries += 1;
                }
                return self;
            }
            SearchOutcome::Scored {
                outcome,
                elapsed_ms,
            } => (outcome, *elapsed_ms),
        };

        self.succeeded += 1;
        self.latencies.push(elapsed_ms);
        if q.contextual {
            self.contextual_queries += 1;
        }
        if q.non_empty {
            self.non_empty += 1;
        }
        if q.first_relevant_rank == 1 {
            self.top1_correct += 1;
            if q.contextual {
                self.contextual_top1 += 1;
            }
        }
        if q.first_relevant_rank > 0 {
            self.top5_hit += 1;
            if q.contextual {
                self.contextual_top5 += 1;
            }
        }
        self.precision_sum += q.precision_at_k();
        self.reciprocal_rank_sum += q.reciprocal_rank();

        if let Some(depth) = q.top1_depth {
            self.top1_depth_sum += depth;
            self.top1_depth_count += 1;
            if depth <= f64::from(q.query_depth) {
                self.top1_within_depth += 1;
            }
        }
        self.relevant_depth_sum += q.relevant_depths.iter().sum::<f64>();
        self.relevant_depth_count += q.relevant_depths.len();
        self
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.non_empty += other.non_empty;
        self.top1_correct += other.top1_correct;
        self.top5_hit += other.top5_hit;
        self.precision_sum += other.precision_sum;
        self.reciprocal_rank_sum += other.reciprocal_rank_sum;
        self.contextual_queries += other.contextual_queries;
        self.contextual_top1 += other.contextual_top1;
        self.contextual_top5 += other.contextual_top5;
        self.top1_depth_sum += other.top1_depth_sum;
        self.top1_depth_count += other.top1_depth_count;
        self.top1_within_depth += other.top1_within_depth;
        self.relevant_depth_sum += other.relevant_depth_sum;
        self.relevant_depth_count += other.relevant_depth_count;
        self.latencies.extend(other.latencies);
        self
    }

    /// Every attempted query, failures included; never zero.
    fn denominator(&self) -> f64 {
        (self.succeeded + self.failed).max(1) as f64
    }

    pub fn quality(&self) -> SearchQuality {
        let total = self.denominator();
        let contextual = self.contextual_queries as f64;
        SearchQuality {
            non_empty_rate: percentage(self.non_empty as f64, total),
            top1_accuracy: percentage(self.top1_correct as f64, total),
            top5_hit_rate: percentage(self.top5_hit as f64, total),
            precision_at5: percentage(self.precision_sum, total),
            mrr: percentage(self.reciprocal_rank_sum, total),
            contextual_query_count: self.contextual_queries,
            contextual_top1_accuracy: percentage(self.contextual_top1 as f64, contextual),
            contextual_top5_hit_rate: percentage(self.contextual_top5 as f64, contextual),
        }
    }

    pub fn depth(&self) -> DepthMetrics {
        DepthMetrics {
            avg_top1_depth: mean(self.top1_depth_sum, self.top1_depth_count),
            avg_relevant_depth_top5: mean(self.relevant_depth_sum, self.relevant_depth_count),
            top1_within_query_depth_rate: percentage(
                self.top1_within_depth as f64,
                self.top1_depth_count as f64,
            ),
        }
    }

    pub fn searches(&self, duration_ms: f64) -> SearchSummary {
        SearchSummary {
            operations: OperationSummary::new(
                self.succeeded,
                self.failed,
                &self.latencies,
                duration_ms,
            ),
            quality: self.quality(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuality {
    pub non_empty_rate: f64,
    pub top1_accuracy: f64,
    pub top5_hit_rate: f64,
    pub precision_at5: f64,
    pub mrr: f64,
    pub contextual_query_count: usize,
    pub contextual_top1_accuracy: f64,
    pub contextual_top5_hit_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    #[serde(flatten)]
    pub operations: OperationSummary,
    #[serde(flatten)]
    pub quality: SearchQuality,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthMetrics {
    pub avg_top1_depth: f64,
    pub avg_relevant_depth_top5: f64,
    pub top1_within_query_depth_rate: f64,
}
