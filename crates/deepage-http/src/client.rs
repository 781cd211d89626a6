//! `MemoryService` over the service's HTTP/JSON API.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::{debug, warn};

use deepage_core::metrics::round3;
use deepage_core::service::{
    FailureKind, HealthStatus, MemoryService, RegistryEntry, SearchHit, SearchRequest,
    SearchResponse, ServiceError, ServiceResult, StoredContent, Timed, WriteAck,
};

const INDEX_HEADER: &str = "X-Index-ID";
const MAX_TRANSPORT_WAIT: Duration = Duration::from_secs(10);
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// Bounded linear backoff. Attempt `n` (0-based) waits `backoff · (n + 1)`,
/// capped per failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    fn linear(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt + 1)
    }

    pub fn transport_delay(&self, attempt: u32) -> Duration {
        self.linear(attempt).min(MAX_TRANSPORT_WAIT)
    }

    /// A positive integral `Retry-After` (seconds) wins over the backoff.
    pub fn rate_limit_delay(&self, attempt: u32, retry_after: Option<&str>) -> Duration {
        match retry_after.and_then(|v| v.trim().parse::<u64>().ok()) {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => self.linear(attempt).min(MAX_RATE_LIMIT_WAIT),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(6, Duration::from_millis(1000))
    }
}

pub struct HttpService {
    agent: ureq::Agent,
    base_url: String,
    policy: RetryPolicy,
}

impl HttpService {
    pub fn new(base_url: &str, timeout: Duration, policy: RetryPolicy) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one JSON request under the retry policy. The elapsed time covers
    /// every attempt and wait.
    fn request_json(
        &self,
        method: &str,
        path: &str,
        index_id: Option<&str>,
        body: Option<&Value>,
    ) -> ServiceResult<Timed<Value>> {
        let url = format!("{}{}", self.base_url, path);
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            let mut request = self
                .agent
                .request(method, &url)
                .set("Accept", "application/json");
            if let Some(id) = index_id {
                request = request.set(INDEX_HEADER, id);
            }
            let response = match body {
                Some(b) => request.send_json(b),
                None => request.call(),
            };

            match response {
                Ok(resp) => {
                    let data = read_body(resp, method, path)?;
                    return Ok(Timed::new(data, elapsed_ms(started)));
                }
                Err(ureq::Error::Status(429, resp)) if attempt < self.policy.max_retries => {
                    let wait = self
                        .policy
                        .rate_limit_delay(attempt, resp.header("Retry-After"));
                    warn!(
                        "rate limited on {method} {path}; retrying in {}s ({}/{})",
                        wait.as_secs_f64().round(),
                        attempt + 1,
                        self.policy.max_retries
                    );
                    thread::sleep(wait);
                }
                Err(ureq::Error::Status(code, resp)) => {
                    let data = read_body(resp, method, path).unwrap_or(Value::Null);
                    let kind = if code == 429 {
                        FailureKind::RateLimited
                    } else {
                        FailureKind::Status(code)
                    };
                    return Err(ServiceError::new(
                        kind,
                        format!("{method} {path} -> {code}: {data}"),
                    ));
                }
                Err(ureq::Error::Transport(t)) => {
                    let kind = transport_kind(&t);
                    if attempt < self.policy.max_retries {
                        let wait = self.policy.transport_delay(attempt);
                        warn!(
                            "{method} {path} failed ({t}); retrying in {}ms ({}/{})",
                            wait.as_millis(),
                            attempt + 1,
                            self.policy.max_retries
                        );
                        thread::sleep(wait);
                    } else {
                        return Err(ServiceError::new(
                            kind,
                            format!(
                                "{method} {path} failed after {}ms: {t}",
                                round3(elapsed_ms(started))
                            ),
                        ));
                    }
                }
            }
            attempt += 1;
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Timeouts surface as an I/O error of kind `TimedOut` (or `WouldBlock` from
/// a socket read timeout) under either an `Io` or a `ConnectionFailed`
/// transport error. Everything else is a connection failure.
fn transport_kind(t: &ureq::Transport) -> FailureKind {
    let io_kind = std::error::Error::source(t)
        .and_then(|e| e.downcast_ref::<io::Error>())
        .map(io::Error::kind);
    match (t.kind(), io_kind) {
        (
            ureq::ErrorKind::Io | ureq::ErrorKind::ConnectionFailed,
            Some(io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock),
        ) => FailureKind::Timeout,
        _ => FailureKind::Connection,
    }
}

fn read_body(resp: ureq::Response, method: &str, path: &str) -> ServiceResult<Value> {
    let text = resp.into_string().map_err(|e| {
        ServiceError::new(
            FailureKind::MalformedBody,
            format!("{method} {path}: unreadable body: {e}"),
        )
    })?;
    Ok(parse_body(&text))
}

/// Empty bodies become `{}`, non-JSON bodies are wrapped as `{"raw": text}`.
pub fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

/// Percent-encode one path segment, leaving the characters
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )` as they are.
pub fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Identifier from a write response: `_id` first, then `id`. Numbers are
/// accepted and stringified; empty strings count as missing.
fn extract_id(data: &Value) -> Option<String> {
    ["_id", "id"].iter().find_map(|key| match data.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn extract_hits(data: &Value) -> Vec<SearchHit> {
    let Some(items) = data.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| {
            serde_json::from_value(item.clone()).unwrap_or(SearchHit {
                content: String::new(),
                depth: None,
            })
        })
        .collect()
}

fn extract_count(data: &Value) -> u64 {
    match data.get("count") {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| *v > 0.0).map(|v| v as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

impl MemoryService for HttpService {
    fn health(&self) -> ServiceResult<HealthStatus> {
        let timed = self.request_json("GET", "/health", None, None)?;
        let status = match timed.value.get("status") {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };
        Ok(HealthStatus { status })
    }

    fn find_or_create_index(
        &self,
        index_id: &str,
        metadata: &Value,
    ) -> ServiceResult<RegistryEntry> {
        let body = json!({ "uuid": index_id, "metadata": metadata });
        let timed = self.request_json("POST", "/v1/registry/find-or-create", None, Some(&body))?;
        let uuid = timed
            .value
            .get("uuid")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(index_id)
            .to_string();
        let created = timed
            .value
            .get("created")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(RegistryEntry { uuid, created })
    }

    fn write(&self, index_id: &str, content: &str) -> ServiceResult<Timed<WriteAck>> {
        let body = json!({ "content": content });
        let timed = self.request_json("POST", "/v1/write", Some(index_id), Some(&body))?;
        let id = extract_id(&timed.value).ok_or_else(|| {
            ServiceError::new(
                FailureKind::MissingField,
                format!("write response missing id: {}", timed.value),
            )
        })?;
        Ok(Timed::new(WriteAck { id }, timed.elapsed_ms))
    }

    fn read(&self, index_id: &str, id: &str) -> ServiceResult<Timed<StoredContent>> {
        let path = format!("/v1/read/{}", encode_path_segment(id));
        let timed = self.request_json("GET", &path, Some(index_id), None)?;
        let content = timed
            .value
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Timed::new(StoredContent { content }, timed.elapsed_ms))
    }

    fn search(
        &self,
        index_id: &str,
        request: &SearchRequest,
    ) -> ServiceResult<Timed<SearchResponse>> {
        let body = serde_json::to_value(request).map_err(|e| {
            ServiceError::new(FailureKind::MalformedBody, format!("search request: {e}"))
        })?;
        let timed = self.request_json("POST", "/v1/search", Some(index_id), Some(&body))?;
        let results = extract_hits(&timed.value);
        debug!(query = %request.query, hits = results.len(), "search");
        Ok(Timed::new(SearchResponse { results }, timed.elapsed_ms))
    }

    fn recall(&self, index_id: &str) -> ServiceResult<Timed<u64>> {
        let timed = self.request_json("GET", "/v1/recall", Some(index_id), None)?;
        Ok(Timed::new(extract_count(&timed.value), timed.elapsed_ms))
    }

    fn stats(&self, index_id: &str) -> ServiceResult<Value> {
        Ok(self
            .request_json("GET", "/v1/brain/stats", Some(index_id), None)?
            .value)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::net::TcpListener;

    fn service(base_url: &str, retries: u32) -> HttpService {
        HttpService::new(
            base_url,
            Duration::from_secs(5),
            RetryPolicy::new(retries, Duration::from_millis(5)),
        )
    }

    #[test]
    fn test_retry_policy_delays() {
        let p = RetryPolicy::new(6, Duration::from_millis(1000));
        assert_eq!(p.transport_delay(0), Duration::from_millis(1000));
        assert_eq!(p.transport_delay(3), Duration::from_millis(4000));
        assert_eq!(p.transport_delay(20), Duration::from_secs(10));
        assert_eq!(p.rate_limit_delay(0, Some("3")), Duration::from_secs(3));
        assert_eq!(p.rate_limit_delay(1, Some("0")), Duration::from_millis(2000));
        assert_eq!(p.rate_limit_delay(1, Some("soon")), Duration::from_millis(2000));
        assert_eq!(p.rate_limit_delay(100, None), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), json!({}));
        assert_eq!(parse_body("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_body("oops"), json!({"raw": "oops"}));
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("abc-123_x.y"), "abc-123_x.y");
        assert_eq!(encode_path_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_path_segment("é"), "%C3%A9");
    }

    #[test]
    fn test_extract_id_prefers_underscore() {
        assert_eq!(extract_id(&json!({"_id": "x", "id": "y"})), Some("x".into()));
        assert_eq!(extract_id(&json!({"_id": "", "id": "y"})), Some("y".into()));
        assert_eq!(extract_id(&json!({"id": 17})), Some("17".into()));
        assert_eq!(extract_id(&json!({"ok": true})), None);
    }

    #[test]
    fn test_extract_hits_tolerates_shapes() {
        assert!(extract_hits(&json!({})).is_empty());
        assert!(extract_hits(&json!({"results": "nope"})).is_empty());
        let hits = extract_hits(&json!({"results": [{"content": "a", "depth": 2}, "junk"]}));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].depth, Some(2.0));
        assert_eq!(hits[1].content, "");
    }

    #[test]
    fn test_extract_count() {
        assert_eq!(extract_count(&json!({"count": 12})), 12);
        assert_eq!(extract_count(&json!({"count": "7"})), 7);
        assert_eq!(extract_count(&json!({})), 0);
    }

    #[test]
    fn test_write_sends_index_header_and_reads_id() {
        let server = MockServer::start();
        let write = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/write")
                .header("x-index-id", "deepage-a-1")
                .json_body(json!({"content": "hello"}));
            then.status(200).json_body(json!({"_id": "n-1"}));
        });

        let ack = service(&server.base_url(), 0)
            .write("deepage-a-1", "hello")
            .unwrap();
        assert_eq!(ack.value.id, "n-1");
        assert!(ack.elapsed_ms >= 0.0);
        write.assert();
    }

    #[test]
    fn test_write_missing_id_is_an_error() {
        let server = MockServer::start();
        let write = server.mock(|when, then| {
            when.method(POST).path("/v1/write");
            then.status(200).json_body(json!({"ok": true}));
        });
        let err = service(&server.base_url(), 0).write("idx", "x").unwrap_err();
        assert_eq!(err.kind, FailureKind::MissingField);
        write.assert_hits(1);
    }

    #[test]
    fn test_search_posts_request_and_reads_hits() {
        let server = MockServer::start();
        let search = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/search")
                .header("x-index-id", "idx")
                .json_body(json!({"query": "reliability", "depth": 3, "limit": 10}));
            then.status(200).json_body(json!({
                "results": [{"content": "[topic:reliability]", "depth": 3}]
            }));
        });
        let request = SearchRequest {
            query: "reliability".into(),
            depth: 3,
            limit: 10,
        };
        let resp = service(&server.base_url(), 0).search("idx", &request).unwrap();
        assert_eq!(resp.value.results.len(), 1);
        assert_eq!(resp.value.results[0].depth, Some(3.0));
        search.assert();
    }

    #[test]
    fn test_rate_limit_is_retried_until_budget_runs_out() {
        let server = MockServer::start();
        let recall = server.mock(|when, then| {
            when.method(GET).path("/v1/recall").header("x-index-id", "idx");
            then.status(429).json_body(json!({}));
        });
        let err = service(&server.base_url(), 2).recall("idx").unwrap_err();
        assert_eq!(err.kind, FailureKind::RateLimited);
        recall.assert_hits(3);
    }

    #[test]
    fn test_rate_limit_waits_for_retry_after() {
        let server = MockServer::start();
        let stats = server.mock(|when, then| {
            when.method(GET).path("/v1/brain/stats");
            then.status(429).header("Retry-After", "1").body("{}");
        });
        let started = Instant::now();
        let err = service(&server.base_url(), 1).stats("idx").unwrap_err();
        assert_eq!(err.kind, FailureKind::RateLimited);
        assert!(started.elapsed() >= Duration::from_secs(1));
        stats.assert_hits(2);
    }

    #[test]
    fn test_server_error_fails_without_retry() {
        let server = MockServer::start();
        let read = server.mock(|when, then| {
            when.method(GET).path("/v1/read/n-1").header("x-index-id", "idx");
            then.status(500).json_body(json!({"error": "boom"}));
        });
        let err = service(&server.base_url(), 3).read("idx", "n-1").unwrap_err();
        assert_eq!(err.kind, FailureKind::Status(500));
        assert!(err.detail.contains("/v1/read/n-1"));
        assert!(err.detail.contains("boom"));
        read.assert_hits(1);
    }

    #[test]
    fn test_slow_response_is_a_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/recall");
            then.status(200)
                .delay(Duration::from_millis(1500))
                .json_body(json!({"count": 1}));
        });
        let svc = HttpService::new(
            &server.base_url(),
            Duration::from_millis(200),
            RetryPolicy::new(0, Duration::from_millis(5)),
        );
        let err = svc.recall("idx").unwrap_err();
        assert_eq!(err.kind, FailureKind::Timeout);
    }

    #[test]
    fn test_connection_refused_after_retries() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = service(&format!("http://{addr}"), 1).health().unwrap_err();
        assert_eq!(err.kind, FailureKind::Connection);
        assert!(err.detail.contains("GET /health failed after"));
    }

    #[test]
    fn test_registry_falls_back_to_requested_uuid() {
        let server = MockServer::start();
        let registry = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/registry/find-or-create")
                .header_missing("x-index-id")
                .json_body(json!({"uuid": "deepage-b-9", "metadata": {"indexLabel": "beta"}}));
            then.status(200).body("");
        });
        let entry = service(&server.base_url(), 0)
            .find_or_create_index("deepage-b-9", &json!({"indexLabel": "beta"}))
            .unwrap();
        assert_eq!(entry.uuid, "deepage-b-9");
        assert!(!entry.created);
        registry.assert();
    }

    #[test]
    fn test_health_reads_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).json_body(json!({"status": "Healthy"}));
        });
        let status = service(&server.base_url(), 0).health().unwrap();
        assert!(status.is_healthy());
    }

    #[test]
    fn test_health_without_status_field_is_not_healthy() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).json_body(json!({"state": "healthy"}));
        });
        let status = service(&server.base_url(), 0).health().unwrap();
        assert_eq!(status.status, "");
        assert!(!status.is_healthy());
    }

    #[test]
    fn test_health_plain_text_body_is_not_healthy() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).body("healthy");
        });
        let status = service(&server.base_url(), 0).health().unwrap();
        assert!(!status.is_healthy());
    }
}
