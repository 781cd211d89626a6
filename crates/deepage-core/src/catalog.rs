//! Static reference data: topics, knowledge catalogs and word banks.
//!
//! Order matters. The generator indexes these slices with PRNG draws, so
//! reordering or editing an entry changes every corpus generated afterwards.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub id: &'static str,
    pub canonical: &'static str,
    pub synonyms: &'static [&'static str],
    pub related: &'static [&'static str],
}

impl Topic {
    /// Ground-truth marker embedded in every document about this topic.
    pub fn marker(&self) -> String {
        format!("[topic:{}]", self.id)
    }
}

/// A film or book record. Films list their cast as contributors; books list
/// the author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnowledgeEntity {
    pub title: &'static str,
    pub contributors: &'static [&'static str],
    pub topics: &'static [&'static str],
}

pub fn topic_by_id(id: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|t| t.id == id)
}

/// Every topic except `id`, in catalog order.
pub fn other_topics(id: &str) -> Vec<&'static Topic> {
    TOPICS.iter().filter(|t| t.id != id).collect()
}

/// Infer the topic of a lowercased result body from its embedded marker.
pub fn infer_topic_id(content_lower: &str) -> &'static str {
    TOPICS
        .iter()
        .find(|t| content_lower.contains(&t.marker()))
        .map(|t| t.id)
        .unwrap_or(UNKNOWN_TOPIC)
}

pub const UNKNOWN_TOPIC: &str = "unknown";

pub const SYLLABLES: &[&str] = &[
    "al", "tor", "mi", "zen", "qua", "rio", "vak", "len", "dri", "sol", "nar", "pex", "lum", "cai",
    "tri", "vor", "shi", "pra", "tek", "mur",
];

pub const TOPICS: &[Topic] = &[
    Topic {
        id: "distributed-systems",
        canonical: "distributed systems",
        synonyms: &["replica coordination", "quorum agreement", "cluster consensus"],
        related: &["raft", "leader election", "state machine replication"],
    },
    Topic {
        id: "neural-memory",
        canonical: "neural memory",
        synonyms: &["adaptive recall", "context memory", "memory consolidation"],
        related: &["hebbian linkage", "depth decay", "activation trail"],
    },
    Topic {
        id: "database-indexing",
        canonical: "database indexing",
        synonyms: &["query indexing", "lookup acceleration", "storage indexing"],
        related: &["btree", "hash key", "cardinality"],
    },
    Topic {
        id: "observability",
        canonical: "system observability",
        synonyms: &["telemetry tracking", "runtime monitoring", "signal tracing"],
        related: &["latency histogram", "trace span", "error budget"],
    },
    Topic {
        id: "ml-pipelines",
        canonical: "machine learning pipelines",
        synonyms: &["model workflow", "feature pipeline", "training pipeline"],
        related: &["feature store", "batch scoring", "drift detection"],
    },
    Topic {
        id: "privacy-security",
        canonical: "privacy security",
        synonyms: &["data protection", "privacy guardrails", "security hardening"],
        related: &["least privilege", "token rotation", "audit trail"],
    },
    Topic {
        id: "edge-computing",
        canonical: "edge computing",
        synonyms: &["edge runtime", "near-device processing", "on-prem inference"],
        related: &["latency locality", "edge cache", "offline mode"],
    },
    Topic {
        id: "reliability",
        canonical: "service reliability",
        synonyms: &["fault tolerance", "resilience strategy", "availability planning"],
        related: &["graceful degradation", "circuit breaker", "retry budget"],
    },
    Topic {
        id: "semantic-search",
        canonical: "semantic search",
        synonyms: &["meaning based retrieval", "hybrid retrieval", "vector search"],
        related: &["embedding distance", "cosine similarity", "relevance score"],
    },
    Topic {
        id: "event-streaming",
        canonical: "event streaming",
        synonyms: &["stream processing", "event-driven flow", "message streaming"],
        related: &["consumer lag", "offset commit", "window aggregation"],
    },
];

pub const FILMS: &[KnowledgeEntity] = &[
    KnowledgeEntity {
        title: "Inception",
        contributors: &["Leonardo DiCaprio", "Joseph Gordon-Levitt", "Elliot Page"],
        topics: &["dream invasion", "memory layers", "corporate espionage"],
    },
    KnowledgeEntity {
        title: "Interstellar",
        contributors: &["Matthew McConaughey", "Anne Hathaway", "Jessica Chastain"],
        topics: &["space travel", "time dilation", "planet survival"],
    },
    KnowledgeEntity {
        title: "The Matrix",
        contributors: &["Keanu Reeves", "Carrie-Anne Moss", "Laurence Fishburne"],
        topics: &["simulated reality", "awakening", "machine resistance"],
    },
    KnowledgeEntity {
        title: "Blade Runner 2049",
        contributors: &["Ryan Gosling", "Harrison Ford", "Ana de Armas"],
        topics: &["identity", "implanted memory", "dystopian investigation"],
    },
    KnowledgeEntity {
        title: "Arrival",
        contributors: &["Amy Adams", "Jeremy Renner", "Forest Whitaker"],
        topics: &["linguistics", "alien contact", "nonlinear time"],
    },
    KnowledgeEntity {
        title: "The Godfather",
        contributors: &["Marlon Brando", "Al Pacino", "James Caan"],
        topics: &["family loyalty", "organized crime", "power transition"],
    },
    KnowledgeEntity {
        title: "Parasite",
        contributors: &["Song Kang-ho", "Lee Sun-kyun", "Cho Yeo-jeong"],
        topics: &["class divide", "deception", "social satire"],
    },
    KnowledgeEntity {
        title: "The Dark Knight",
        contributors: &["Christian Bale", "Heath Ledger", "Gary Oldman"],
        topics: &["justice", "chaos", "moral compromise"],
    },
    KnowledgeEntity {
        title: "Mad Max Fury Road",
        contributors: &["Tom Hardy", "Charlize Theron", "Nicholas Hoult"],
        topics: &["wasteland survival", "rebellion", "resource scarcity"],
    },
    KnowledgeEntity {
        title: "Her",
        contributors: &["Joaquin Phoenix", "Scarlett Johansson", "Amy Adams"],
        topics: &["human ai relationship", "loneliness", "digital intimacy"],
    },
    KnowledgeEntity {
        title: "Ex Machina",
        contributors: &["Alicia Vikander", "Domhnall Gleeson", "Oscar Isaac"],
        topics: &["ai ethics", "manipulation", "consciousness"],
    },
    KnowledgeEntity {
        title: "The Social Network",
        contributors: &["Jesse Eisenberg", "Andrew Garfield", "Rooney Mara"],
        topics: &["startup conflict", "ambition", "betrayal"],
    },
    KnowledgeEntity {
        title: "The Prestige",
        contributors: &["Hugh Jackman", "Christian Bale", "Scarlett Johansson"],
        topics: &["rivalry", "illusion", "sacrifice"],
    },
    KnowledgeEntity {
        title: "Oppenheimer",
        contributors: &["Cillian Murphy", "Emily Blunt", "Robert Downey Jr"],
        topics: &["science ethics", "war politics", "historical accountability"],
    },
    KnowledgeEntity {
        title: "Everything Everywhere All at Once",
        contributors: &["Michelle Yeoh", "Ke Huy Quan", "Stephanie Hsu"],
        topics: &["multiverse", "family pressure", "identity"],
    },
    KnowledgeEntity {
        title: "Whiplash",
        contributors: &["Miles Teller", "J K Simmons", "Melissa Benoist"],
        topics: &["perfectionism", "mentorship", "obsession"],
    },
    KnowledgeEntity {
        title: "Moneyball",
        contributors: &["Brad Pitt", "Jonah Hill", "Philip Seymour Hoffman"],
        topics: &["sports analytics", "undervalued talent", "strategy"],
    },
    KnowledgeEntity {
        title: "The Imitation Game",
        contributors: &["Benedict Cumberbatch", "Keira Knightley", "Matthew Goode"],
        topics: &["cryptography", "war intelligence", "secrecy"],
    },
    KnowledgeEntity {
        title: "Spirited Away",
        contributors: &["Rumi Hiiragi", "Miyu Irino", "Mari Natsuki"],
        topics: &["coming of age", "spirit world", "identity"],
    },
    KnowledgeEntity {
        title: "The Grand Budapest Hotel",
        contributors: &["Ralph Fiennes", "Tony Revolori", "Saoirse Ronan"],
        topics: &["friendship", "nostalgia", "crime comedy"],
    },
];

pub const BOOKS: &[KnowledgeEntity] = &[
    KnowledgeEntity {
        title: "Dune",
        contributors: &["Frank Herbert"],
        topics: &["desert ecology", "prophecy", "empire politics"],
    },
    KnowledgeEntity {
        title: "1984",
        contributors: &["George Orwell"],
        topics: &["surveillance", "authoritarianism", "language control"],
    },
    KnowledgeEntity {
        title: "Pride and Prejudice",
        contributors: &["Jane Austen"],
        topics: &["class", "marriage", "social expectations"],
    },
    KnowledgeEntity {
        title: "The Hobbit",
        contributors: &["J R R Tolkien"],
        topics: &["adventure", "friendship", "courage"],
    },
    KnowledgeEntity {
        title: "To Kill a Mockingbird",
        contributors: &["Harper Lee"],
        topics: &["justice", "racism", "empathy"],
    },
    KnowledgeEntity {
        title: "Sapiens",
        contributors: &["Yuval Noah Harari"],
        topics: &["human evolution", "culture", "cooperation"],
    },
    KnowledgeEntity {
        title: "Neuromancer",
        contributors: &["William Gibson"],
        topics: &["cyberspace", "hacking", "ai influence"],
    },
    KnowledgeEntity {
        title: "The Left Hand of Darkness",
        contributors: &["Ursula K Le Guin"],
        topics: &["gender", "diplomacy", "political tension"],
    },
    KnowledgeEntity {
        title: "The Three-Body Problem",
        contributors: &["Liu Cixin"],
        topics: &["physics", "civilization conflict", "strategy"],
    },
    KnowledgeEntity {
        title: "Atomic Habits",
        contributors: &["James Clear"],
        topics: &["behavior systems", "habit loops", "incremental change"],
    },
    KnowledgeEntity {
        title: "The Catcher in the Rye",
        contributors: &["J D Salinger"],
        topics: &["adolescence", "alienation", "identity"],
    },
    KnowledgeEntity {
        title: "The Brothers Karamazov",
        contributors: &["Fyodor Dostoevsky"],
        topics: &["faith", "morality", "family conflict"],
    },
    KnowledgeEntity {
        title: "Beloved",
        contributors: &["Toni Morrison"],
        topics: &["memory", "trauma", "motherhood"],
    },
    KnowledgeEntity {
        title: "The Road",
        contributors: &["Cormac McCarthy"],
        topics: &["survival", "fatherhood", "apocalypse"],
    },
    KnowledgeEntity {
        title: "Thinking Fast and Slow",
        contributors: &["Daniel Kahneman"],
        topics: &["cognitive bias", "decision making", "psychology"],
    },
    KnowledgeEntity {
        title: "A Brief History of Time",
        contributors: &["Stephen Hawking"],
        topics: &["cosmology", "black holes", "physics"],
    },
    KnowledgeEntity {
        title: "The Alchemist",
        contributors: &["Paulo Coelho"],
        topics: &["destiny", "journey", "symbolism"],
    },
    KnowledgeEntity {
        title: "The Martian",
        contributors: &["Andy Weir"],
        topics: &["science survival", "problem solving", "space"],
    },
    KnowledgeEntity {
        title: "Project Hail Mary",
        contributors: &["Andy Weir"],
        topics: &["first contact", "friendship", "space engineering"],
    },
    KnowledgeEntity {
        title: "The Name of the Wind",
        contributors: &["Patrick Rothfuss"],
        topics: &["magic", "memory", "storytelling"],
    },
];

pub const ACTORS: &[&str] = &[
    "the platform team",
    "a reliability engineer",
    "an autonomous agent",
    "the storage subsystem",
    "a data scientist",
    "the orchestration layer",
    "an integration test suite",
    "a benchmark harness",
    "the indexing daemon",
    "a production rollout",
    "a data governance lead",
    "the edge gateway",
    "a stream processing job",
    "the semantic ranking pipeline",
    "an observability analyst",
    "a feature engineering cluster",
    "the release automation bot",
    "a runtime policy evaluator",
    "a query optimizer",
    "the memory compaction worker",
    "a fault injection test",
    "the indexing coordinator",
    "an API contract checker",
    "the disaster recovery planner",
    "a synthetic traffic generator",
    "an adaptive load balancer",
    "the schema migration process",
    "a privacy compliance scanner",
    "a hybrid retrieval evaluator",
    "the backlog replay worker",
];

pub const VERBS: &[&str] = &[
    "maps",
    "evaluates",
    "rechecks",
    "stabilizes",
    "profiles",
    "observes",
    "amplifies",
    "reduces",
    "documents",
    "validates",
    "correlates",
    "benchmarks",
    "triangulates",
    "diagnoses",
    "reconstructs",
    "normalizes",
    "decomposes",
    "contextualizes",
    "prioritizes",
    "reconciles",
    "isolates",
    "stress-tests",
    "rebalances",
    "replays",
    "instrumentalizes",
    "cross-checks",
    "backfills",
    "re-scores",
    "compresses",
    "annotates",
];

pub const OBJECTS: &[&str] = &[
    "runtime behavior",
    "search outcomes",
    "latency drift",
    "consistency boundaries",
    "query intent",
    "memory traces",
    "error surfaces",
    "throughput variance",
    "depth transitions",
    "semantic overlap",
    "index isolation",
    "vector-lexical balance",
    "token budget pressure",
    "neuron activation history",
    "cross-region replication signals",
    "write amplification side effects",
    "cache eviction dynamics",
    "saturation thresholds",
    "cold-start penalties",
    "query fan-out patterns",
    "response quality regressions",
    "anomaly clusters",
    "failure-domain boundaries",
    "capacity planning assumptions",
    "retrieval confidence deltas",
    "concurrency edge cases",
    "error budget burn rate",
    "dependency ripple effects",
    "lifecycle transition timing",
    "ranking stability under noise",
];

pub const FILLER_PHRASES: &[&str] = &[
    "while balancing short, medium, and long context windows",
    "under realistic write-read-search pressure",
    "with randomized English content and controlled anchors",
    "to compare top-k retrieval quality against expected topics",
    "without introducing deterministic repetition artifacts",
    "while tracking depth-aware retrieval behavior",
    "to check if related vocabulary remains discoverable",
    "with strict timing capture for every operation",
    "to verify index isolation and cross-index consistency",
    "without relying on synthetic single-word prompts",
    "while preserving index-level statistical comparability",
    "to emulate bursty ingestion shaped by sinusoidal intervals",
    "with distractor terms blended into the same paragraph",
    "so similarity-based ranking cannot memorize one rigid phrase",
    "while rotating lexical style between formal and conversational tones",
    "so repeated runs retain semantic intent but not exact phrasing",
    "with neighboring topic hints that challenge shallow keyword matches",
    "to surface borderline retrieval scenarios instead of only perfect matches",
    "while continuously changing clause order and narrative shape",
    "to force the engine to rank by relevance, not by template identity",
];

pub const TRANSITIONS: &[&str] = &[
    "Meanwhile",
    "In parallel",
    "After that",
    "At the same time",
    "In the same experiment",
    "During this cycle",
    "For the next interval",
    "Under the same constraints",
    "Across repeated runs",
    "Within the current phase",
    "In a separate replay window",
    "With a fresh random seed",
    "On the following checkpoint",
    "During the validation pass",
    "As the load profile shifts",
    "Across a new burst segment",
    "Within the same synthetic storyline",
    "During comparative probing",
    "As the memory graph grows",
    "When interval pressure increases",
];

pub const QUALIFIERS: &[&str] = &[
    "carefully",
    "incrementally",
    "aggressively",
    "methodically",
    "selectively",
    "safely",
    "adaptively",
    "deterministically",
    "heuristically",
    "probabilistically",
    "iteratively",
    "systematically",
    "predictably",
    "resiliently",
    "semantically",
    "lexically",
    "contextually",
    "observably",
    "transparently",
    "continuously",
];

pub const LOCATIONS: &[&str] = &[
    "in Stockholm",
    "in Toronto",
    "in Frankfurt",
    "in Singapore",
    "in São Paulo",
    "in Seoul",
    "in Madrid",
    "in Cape Town",
    "in Melbourne",
    "in Helsinki",
    "in Istanbul",
    "in Montréal",
    "in Dublin",
    "in Zurich",
    "in Taipei",
];

pub const DATA_POINTS: &[&str] = &[
    "queue depth",
    "tail latency",
    "token drift",
    "retrieval confidence",
    "error skew",
    "topic bleed",
    "document freshness",
    "index pressure",
    "branch entropy",
    "result volatility",
    "activation spread",
    "relevance variance",
    "cache churn",
    "write jitter",
    "read amplification",
    "search fan-out",
    "ranking entropy",
    "recall sharpness",
    "consistency gap",
    "schema pressure",
];

pub const TIME_WINDOWS: &[&str] = &[
    "for the last 90 seconds",
    "during a 3-minute surge",
    "across a 15-minute replay",
    "inside a rolling 7-minute window",
    "over a 45-second burst",
    "within two back-to-back intervals",
    "throughout the evening test batch",
    "while overnight maintenance traffic is replayed",
    "in a low-traffic morning run",
    "during a noisy canary slice",
    "across two consecutive benchmark epochs",
    "inside a mixed-latency scenario",
];

pub const CONNECTORS: &[&str] = &[
    "and",
    "while",
    "because",
    "although",
    "unless",
    "so that",
    "whereas",
    "before",
    "after",
    "once",
];

pub const ID_PREFIXES: &[&str] = &[
    "alpha",
    "beta",
    "gamma",
    "delta",
    "omega",
    "theta",
    "sigma",
    "kappa",
    "atlas",
    "nova",
    "pulse",
    "ion",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(TOPICS.len(), 10);
        assert_eq!(FILMS.len(), 20);
        assert_eq!(BOOKS.len(), 20);
        assert!(BOOKS.iter().all(|b| b.contributors.len() == 1));
    }

    #[test]
    fn test_topic_ids_unique() {
        let mut ids: Vec<_> = TOPICS.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), TOPICS.len());
    }

    #[test]
    fn test_other_topics_excludes_self() {
        let others = other_topics("observability");
        assert_eq!(others.len(), TOPICS.len() - 1);
        assert!(others.iter().all(|t| t.id != "observability"));
        assert_eq!(others[0].id, "distributed-systems");
    }

    #[test]
    fn test_infer_topic_id() {
        let body = "unique marker x [topic:edge-computing] canonical:edge computing";
        assert_eq!(infer_topic_id(body), "edge-computing");
        assert_eq!(infer_topic_id("no marker here"), UNKNOWN_TOPIC);
        assert_eq!(topic_by_id("reliability").unwrap().canonical, "service reliability");
        assert!(topic_by_id("nope").is_none());
    }
}
