//! Cross-index consistency: how similarly two independently seeded corpora
//! built from the same plan score and rank.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::driver::IndexBenchmarkResult;
use crate::metrics::round3;

/// `|a ∩ b| / |a ∪ b|`; two empty sets are identical.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Absolute differences between the two indexes, in percentage points.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDeltas {
    pub top1_accuracy_delta: f64,
    pub top5_hit_rate_delta: f64,
    pub precision_at5_delta: f64,
    pub mrr_delta: f64,
    pub write_success_rate_delta: f64,
    pub read_match_rate_delta: f64,
}

impl MetricDeltas {
    pub fn values(&self) -> [f64; 6] {
        [
            self.top1_accuracy_delta,
            self.top5_hit_rate_delta,
            self.precision_at5_delta,
            self.mrr_delta,
            self.write_success_rate_delta,
            self.read_match_rate_delta,
        ]
    }

    pub fn mean(&self) -> f64 {
        let values = self.values();
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub paired_queries: usize,
    pub avg_query_topical_jaccard: f64,
    pub metric_deltas: MetricDeltas,
    pub consistency_score: f64,
}

fn delta(a: f64, b: f64) -> f64 {
    round3((a - b).abs())
}

/// `max(0, 100 − (mean delta + (100 − jaccard%)) / 2)`, kept in `[0, 100]`.
pub fn consistency_score(deltas: &MetricDeltas, avg_jaccard: f64) -> f64 {
    let raw = 100.0 - (deltas.mean() + (100.0 - avg_jaccard)) / 2.0;
    round3(raw.clamp(0.0, 100.0))
}

/// Compare two runs. Query observations are paired on their query index;
/// a query that failed on either side has no pair.
pub fn compare_indexes(a: &IndexBenchmarkResult, b: &IndexBenchmarkResult) -> ConsistencyReport {
    let metric_deltas = MetricDeltas {
        top1_accuracy_delta: delta(
            a.searches.quality.top1_accuracy,
            b.searches.quality.top1_accuracy,
        ),
        top5_hit_rate_delta: delta(
            a.searches.quality.top5_hit_rate,
            b.searches.quality.top5_hit_rate,
        ),
        precision_at5_delta: delta(
            a.searches.quality.precision_at5,
            b.searches.quality.precision_at5,
        ),
        mrr_delta: delta(a.searches.quality.mrr, b.searches.quality.mrr),
        write_success_rate_delta: delta(a.writes.success_rate, b.writes.success_rate),
        read_match_rate_delta: delta(
            a.reads.exact_content_match_rate,
            b.reads.exact_content_match_rate,
        ),
    };

    let by_index: BTreeMap<usize, &BTreeSet<String>> = b
        .query_observations
        .iter()
        .map(|o| (o.query_index, &o.inferred_top_topics))
        .collect();
    let overlaps: Vec<f64> = a
        .query_observations
        .iter()
        .filter_map(|x| {
            by_index
                .get(&x.query_index)
                .map(|y| jaccard(&x.inferred_top_topics, *y))
        })
        .collect();
    let paired_queries = overlaps.len();
    let jaccard_sum: f64 = overlaps.iter().sum();
    let avg_query_topical_jaccard = if paired_queries == 0 {
        0.0
    } else {
        round3(jaccard_sum / paired_queries as f64 * 100.0)
    };

    ConsistencyReport {
        paired_queries,
        avg_query_topical_jaccard,
        consistency_score: consistency_score(&metric_deltas, avg_query_topical_jaccard),
        metric_deltas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{IndexBenchmarkResult, QueryObservation};
    use crate::synth::QueryKind;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn observation(query_index: usize, topics: &[&str]) -> QueryObservation {
        QueryObservation {
            query_index,
            query: "q".into(),
            query_kind: QueryKind::TopicCanonical,
            query_depth: 1,
            expected_topic_id: "reliability".into(),
            inferred_top_topics: set(topics),
        }
    }

    fn result(top1: f64, observations: Vec<QueryObservation>) -> IndexBenchmarkResult {
        let mut r = IndexBenchmarkResult::empty("idx", "alpha");
        r.searches.quality.top1_accuracy = top1;
        r.writes.success_rate = 100.0;
        r.reads.exact_content_match_rate = 100.0;
        r.query_observations = observations;
        r
    }

    #[test]
    fn test_jaccard_basics() {
        assert_eq!(jaccard(&set(&[]), &set(&[])), 1.0);
        assert_eq!(jaccard(&set(&["a"]), &set(&["a"])), 1.0);
        assert_eq!(jaccard(&set(&["a"]), &set(&["b"])), 0.0);
        assert_eq!(jaccard(&set(&["a", "b"]), &set(&["b", "c"])), 1.0 / 3.0);
        assert_eq!(jaccard(&set(&["a"]), &set(&[])), 0.0);
    }

    #[test]
    fn test_identical_runs_score_100() {
        let obs = || vec![observation(0, &["a", "b"]), observation(1, &["c"])];
        let report = compare_indexes(&result(80.0, obs()), &result(80.0, obs()));
        assert_eq!(report.paired_queries, 2);
        assert_eq!(report.avg_query_topical_jaccard, 100.0);
        assert_eq!(report.metric_deltas, MetricDeltas::default());
        assert_eq!(report.consistency_score, 100.0);
    }

    #[test]
    fn test_unmatched_queries_are_not_paired() {
        let a = result(
            50.0,
            vec![
                observation(0, &["a"]),
                observation(1, &["b"]),
                observation(2, &["c"]),
            ],
        );
        let b = result(44.0, vec![observation(0, &["a"]), observation(1, &["x"])]);
        let report = compare_indexes(&a, &b);
        assert_eq!(report.paired_queries, 2);
        assert_eq!(report.avg_query_topical_jaccard, 50.0);
        assert_eq!(report.metric_deltas.top1_accuracy_delta, 6.0);
        // mean delta 1, jaccard gap 50 → 100 - 51/2
        assert_eq!(report.consistency_score, 74.5);
    }

    #[test]
    fn test_pairs_follow_query_index_across_gaps() {
        // Query 0 failed on A, query 2 failed on B.
        let a = result(
            80.0,
            vec![observation(1, &["b"]), observation(2, &["c"]), observation(3, &["d"])],
        );
        let b = result(
            80.0,
            vec![observation(0, &["a"]), observation(1, &["b"]), observation(3, &["d"])],
        );
        let report = compare_indexes(&a, &b);
        assert_eq!(report.paired_queries, 2);
        assert_eq!(report.avg_query_topical_jaccard, 100.0);
        assert_eq!(report.consistency_score, 100.0);
    }

    #[test]
    fn test_no_pairs() {
        let report = compare_indexes(&result(0.0, vec![]), &result(0.0, vec![]));
        assert_eq!(report.paired_queries, 0);
        assert_eq!(report.avg_query_topical_jaccard, 0.0);
        assert_eq!(report.consistency_score, 50.0);
    }

    #[test]
    fn test_score_bounded() {
        let deltas = MetricDeltas {
            top1_accuracy_delta: 100.0,
            top5_hit_rate_delta: 100.0,
            precision_at5_delta: 100.0,
            mrr_delta: 100.0,
            write_success_rate_delta: 100.0,
            read_match_rate_delta: 100.0,
        };
        assert_eq!(consistency_score(&deltas, 0.0), 0.0);
        assert_eq!(consistency_score(&MetricDeltas::default(), 100.0), 100.0);
    }
}
