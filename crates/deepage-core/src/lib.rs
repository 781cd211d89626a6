pub mod catalog;
pub mod consistency;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod plan;
pub mod rng;
pub mod service;
pub mod synth;

pub use catalog::{KnowledgeEntity, Topic, TOPICS};
pub use consistency::{compare_indexes, jaccard, ConsistencyReport, MetricDeltas};
pub use driver::{
    query_depth, run_comparison, BenchSettings, Comparison, IndexBenchmark, IndexBenchmarkResult,
    QueryObservation, RunInfo, DEFAULT_SEED_A, DEFAULT_SEED_B,
};
pub use error::{BenchError, BenchResult};
pub use metrics::{
    percentile, score_hits, DepthMetrics, LatencySummary, OperationSummary, QueryOutcome,
    SearchQuality, SearchTally, WriteTally,
};
pub use plan::{build_plan, Bucket, PlanItem, MIN_ITERATIONS};
pub use rng::Mulberry32;
pub use service::{
    FailureKind, HealthStatus, MemoryService, RecallSummary, RegistryEntry, SearchHit,
    SearchRequest, SearchResponse, ServiceError, ServiceResult, StoredContent, Timed, WriteAck,
};
pub use synth::{query_specs, render_document, QueryKind, QuerySpec, RenderedDocument};
