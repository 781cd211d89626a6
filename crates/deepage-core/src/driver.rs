//! Benchmark driver: one index run is register → write/read-back → search →
//! recall/stats probes, strictly in that order.

use std::collections::BTreeSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::catalog::Topic;
use crate::consistency::{compare_indexes, ConsistencyReport};
use crate::error::BenchResult;
use crate::metrics::{
    round3, score_hits, DepthMetrics, OperationSummary, ReadSummary, SearchOutcome, SearchSummary,
    SearchTally, WriteOutcome, WriteTally,
};
use crate::plan::{build_plan, PlanItem};
use crate::rng::Mulberry32;
use crate::service::{MemoryService, RecallSummary, SearchRequest};
use crate::synth::{query_specs, render_document, QueryKind, QuerySpec};

pub const DEFAULT_SEED_A: u32 = 42;
pub const DEFAULT_SEED_B: u32 = 1337;
pub const REGISTRY_SOURCE: &str = "deepage-benchmark";

const PROGRESS_EVERY: usize = 100;

/// Requested search depth for query number `q`: a slow sine sweep over
/// `1..=8`.
pub fn query_depth(q: usize) -> u32 {
    let raw = 1.0 + (((q as f64 / 31.0).sin() + 1.0) / 2.0) * 7.0;
    (raw.round() as i64).clamp(1, 8) as u32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
}

impl RunInfo {
    pub fn new(prefix: &str) -> Self {
        Self::at(prefix, Utc::now())
    }

    /// Run id is `{prefix}-{timestamp}` with `:` and `.` flattened to `-`.
    pub fn at(prefix: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: format!("{prefix}-{}", started_at.format("%Y-%m-%dT%H-%M-%S-%3fZ")),
            started_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchSettings {
    pub iterations: usize,
    pub search_queries: usize,
    pub search_limit: usize,
}

/// What was asked and what came back for one search, reduced to topic ids.
/// `query_index` is the position in the query sequence, which is what the
/// two runs of a comparison are paired on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryObservation {
    pub query_index: usize,
    pub query: String,
    pub query_kind: QueryKind,
    pub query_depth: u32,
    pub expected_topic_id: String,
    pub inferred_top_topics: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Methodology {
    pub iterations: usize,
    pub search_queries: usize,
    pub search_limit: usize,
    pub query_types_per_record: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBenchmarkResult {
    pub index_id: String,
    pub index_label: String,
    pub writes: OperationSummary,
    pub reads: ReadSummary,
    pub searches: SearchSummary,
    pub depth_metrics: DepthMetrics,
    pub recall: RecallSummary,
    pub brain_stats: Option<Value>,
    pub query_observations: Vec<QueryObservation>,
    pub methodology: Methodology,
    pub run_info: Option<RunInfo>,
}

impl IndexBenchmarkResult {
    pub fn empty(index_id: &str, index_label: &str) -> Self {
        Self {
            index_id: index_id.to_string(),
            index_label: index_label.to_string(),
            writes: OperationSummary::default(),
            reads: ReadSummary::default(),
            searches: SearchSummary::default(),
            depth_metrics: DepthMetrics::default(),
            recall: RecallSummary::default(),
            brain_stats: None,
            query_observations: Vec::new(),
            methodology: Methodology::default(),
            run_info: None,
        }
    }
}

/// One plan slot as seen by the search stage. Slots whose write failed stay
/// in place so query `q` targets the same plan item on every index.
struct PlanSlot {
    topic: &'static Topic,
    specs: Vec<QuerySpec>,
    written: bool,
}

/// One index under test: where it lives, what it is called in reports, and
/// which seed drives its wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBenchmark {
    pub index_id: String,
    pub label: String,
    pub seed: u32,
}

impl IndexBenchmark {
    pub fn new(index_id: impl Into<String>, label: impl Into<String>, seed: u32) -> Self {
        Self {
            index_id: index_id.into(),
            label: label.into(),
            seed,
        }
    }

    /// Run every stage against `service`. Service failures are counted in
    /// the stage they belong to; none of them ends the run early.
    pub fn run<S: MemoryService + ?Sized>(
        &self,
        service: &S,
        plan: &[PlanItem],
        settings: &BenchSettings,
        run_info: &RunInfo,
    ) -> IndexBenchmarkResult {
        self.register(service, run_info);

        info!(index = %self.index_id, documents = plan.len(), "write stage started");
        let write_started = Instant::now();
        let (write_tally, records) = self.write_stage(service, plan);
        let write_ms = elapsed_ms(write_started);
        info!(
            index = %self.index_id,
            written = write_tally.write_success,
            failed = write_tally.write_failed,
            "write stage finished"
        );

        info!(index = %self.index_id, queries = settings.search_queries, "search stage started");
        let search_started = Instant::now();
        let (search_tally, observations) = self.search_stage(service, &records, settings);
        let search_ms = elapsed_ms(search_started);
        info!(
            index = %self.index_id,
            succeeded = search_tally.succeeded,
            failed = search_tally.failed,
            "search stage finished"
        );

        let recall = match service.recall(&self.index_id) {
            Ok(timed) => RecallSummary {
                count: timed.value,
                latency_ms: round3(timed.elapsed_ms),
            },
            Err(e) => {
                debug!(index = %self.index_id, "recall probe failed: {e}");
                RecallSummary::default()
            }
        };
        let brain_stats = service
            .stats(&self.index_id)
            .map_err(|e| debug!(index = %self.index_id, "stats probe failed: {e}"))
            .ok();

        IndexBenchmarkResult {
            index_id: self.index_id.clone(),
            index_label: self.label.clone(),
            writes: write_tally.writes(write_ms),
            reads: write_tally.reads(write_ms),
            searches: search_tally.searches(search_ms),
            depth_metrics: search_tally.depth(),
            recall,
            brain_stats,
            query_observations: observations,
            methodology: Methodology {
                iterations: plan.len(),
                search_queries: settings.search_queries,
                search_limit: settings.search_limit,
                query_types_per_record: records
                    .iter()
                    .find(|r| r.written)
                    .map_or(0, |r| r.specs.len()),
            },
            run_info: Some(run_info.clone()),
        }
    }

    /// Announce the index to the registry. The run keeps using the requested
    /// id whether or not the registry answers.
    fn register<S: MemoryService + ?Sized>(&self, service: &S, run_info: &RunInfo) {
        let metadata = json!({
            "source": REGISTRY_SOURCE,
            "runId": run_info.run_id,
            "indexLabel": self.label,
        });
        match service.find_or_create_index(&self.index_id, &metadata) {
            Ok(entry) => {
                info!(index = %entry.uuid, created = entry.created, "index registered");
            }
            Err(e) => {
                warn!(index = %self.index_id, "registry unavailable, continuing: {e}");
            }
        }
    }

    fn write_stage<S: MemoryService + ?Sized>(
        &self,
        service: &S,
        plan: &[PlanItem],
    ) -> (WriteTally, Vec<PlanSlot>) {
        let mut rng = Mulberry32::new(self.seed);
        let mut records = Vec::with_capacity(plan.len());
        let mut tally = WriteTally::default();

        for (n, item) in plan.iter().enumerate() {
            let doc = render_document(item, &self.label, &mut rng);
            let mut record = PlanSlot {
                topic: item.topic,
                specs: query_specs(item, &doc),
                written: false,
            };

            let outcome = match service.write(&self.index_id, &doc.content) {
                Err(e) => {
                    warn!(index = %self.index_id, iteration = item.iteration, "write failed: {e}");
                    WriteOutcome::WriteFailed
                }
                Ok(ack) => {
                    record.written = true;
                    let id = &ack.value.id;
                    match service.read(&self.index_id, id) {
                        Err(e) => {
                            warn!(index = %self.index_id, %id, "read-back failed: {e}");
                            WriteOutcome::ReadFailed {
                                write_ms: ack.elapsed_ms,
                            }
                        }
                        Ok(stored) => {
                            let exact_match = stored.value.content == doc.content;
                            if !exact_match {
                                debug!(index = %self.index_id, %id, "read-back content differs");
                            }
                            WriteOutcome::Completed {
                                write_ms: ack.elapsed_ms,
                                read_ms: stored.elapsed_ms,
                                exact_match,
                            }
                        }
                    }
                }
            };
            tally = tally.absorb(&outcome);
            records.push(record);

            if (n + 1) % PROGRESS_EVERY == 0 {
                info!(index = %self.index_id, done = n + 1, total = plan.len(), "writing");
            }
        }
        (tally, records)
    }

    fn search_stage<S: MemoryService + ?Sized>(
        &self,
        service: &S,
        records: &[PlanSlot],
        settings: &BenchSettings,
    ) -> (SearchTally, Vec<QueryObservation>) {
        let mut tally = SearchTally::default();
        let mut observations = Vec::new();
        if !records.iter().any(|r| r.written) {
            warn!(index = %self.index_id, "no documents written, skipping searches");
            return (tally, observations);
        }

        for q in 0..settings.search_queries {
            let record = &records[q % records.len()];
            let spec = &record.specs[q % record.specs.len()];
            let depth = query_depth(q);
            let request = SearchRequest {
                query: spec.query.clone(),
                depth,
                limit: settings.search_limit,
            };

            let outcome = match service.search(&self.index_id, &request) {
                Ok(timed) => {
                    let scored = score_hits(&timed.value.results, spec, record.topic, depth);
                    observations.push(QueryObservation {
                        query_index: q,
                        query: spec.query.clone(),
                        query_kind: spec.kind,
                        query_depth: depth,
                        expected_topic_id: record.topic.id.to_string(),
                        inferred_top_topics: scored.inferred_topics.clone(),
                    });
                    SearchOutcome::Scored {
                        outcome: scored,
                        elapsed_ms: timed.elapsed_ms,
                    }
                }
                Err(e) => {
                    warn!(index = %self.index_id, query = q, "search failed: {e}");
                    SearchOutcome::Failed {
                        contextual: spec.kind.is_contextual(),
                    }
                }
            };
            tally = tally.absorb(&outcome);

            if (q + 1) % PROGRESS_EVERY == 0 {
                let total = settings.search_queries;
                info!(index = %self.index_id, done = q + 1, total, "searching");
            }
        }
        (tally, observations)
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub indexes: Vec<IndexBenchmarkResult>,
    pub cross_index_consistency: ConsistencyReport,
}

/// Run both indexes over one shared plan, A then B, and score how closely
/// they agree.
pub fn run_comparison<S: MemoryService + ?Sized>(
    service: &S,
    settings: &BenchSettings,
    a: &IndexBenchmark,
    b: &IndexBenchmark,
    run_info: &RunInfo,
) -> BenchResult<Comparison> {
    let plan = build_plan(settings.iterations)?;
    info!(run = %run_info.run_id, a = %a.index_id, b = %b.index_id, "benchmark run started");

    let result_a = a.run(service, &plan, settings, run_info);
    let result_b = b.run(service, &plan, settings, run_info);
    let consistency = compare_indexes(&result_a, &result_b);
    info!(score = consistency.consistency_score, "consistency computed");

    Ok(Comparison {
        indexes: vec![result_a, result_b],
        cross_index_consistency: consistency,
    })
}
