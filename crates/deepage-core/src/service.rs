//! Boundary with the memory service under test.
//!
//! Every call returns either a typed payload or a tagged [`ServiceError`], so
//! the driver and metrics never poke at optional JSON fields.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "status")]
pub enum FailureKind {
    Timeout,
    Connection,
    RateLimited,
    Status(u16),
    MalformedBody,
    MissingField,
}

impl FailureKind {
    /// Worth another attempt under the retry policy.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Connection | Self::RateLimited)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connection => write!(f, "connection"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Status(code) => write!(f, "status {code}"),
            Self::MalformedBody => write!(f, "malformed body"),
            Self::MissingField => write!(f, "missing field"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct ServiceError {
    pub kind: FailureKind,
    pub detail: String,
}

impl ServiceError {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Payload plus wall-clock latency of the call, retries included.
#[derive(Debug, Clone, PartialEq)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed_ms: f64,
}

impl<T> Timed<T> {
    pub fn new(value: T, elapsed_ms: f64) -> Self {
        Self { value, elapsed_ms }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub uuid: String,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub depth: u32,
    pub limit: usize,
}

/// One ranked result. `depth` is opaque service metadata and may be absent.
/// Null or mistyped fields degrade to empty content / no depth instead of
/// failing the whole response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub depth: Option<f64>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite()))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallSummary {
    pub count: u64,
    pub latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.to_lowercase().contains("healthy")
    }
}

/// Operations the harness consumes. Index-scoped calls take the index id;
/// implementations decide how to route it (header, path, ...).
pub trait MemoryService {
    fn health(&self) -> ServiceResult<HealthStatus>;
    fn find_or_create_index(&self, index_id: &str, metadata: &Value)
        -> ServiceResult<RegistryEntry>;
    fn write(&self, index_id: &str, content: &str) -> ServiceResult<Timed<WriteAck>>;
    fn read(&self, index_id: &str, id: &str) -> ServiceResult<Timed<StoredContent>>;
    fn search(&self, index_id: &str, request: &SearchRequest)
        -> ServiceResult<Timed<SearchResponse>>;
    fn recall(&self, index_id: &str) -> ServiceResult<Timed<u64>>;
    fn stats(&self, index_id: &str) -> ServiceResult<Value>;

    /// Human-readable location of the service, for logs and reports.
    fn describe(&self) -> String;
}
