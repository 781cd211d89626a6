//! Configuration loading from TOML files and the environment.
//!
//! Lookup order (later wins):
//! 1. Built-in defaults
//! 2. `$DEEPAGE_CONFIG`, else `~/.config/deepage/config.toml`
//! 3. `DEEPAGE_BASE_URL` and the `BENCH_*` environment variables
//! 4. Flags on `deepage run`

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use deepage_core::driver::{BenchSettings, DEFAULT_SEED_A, DEFAULT_SEED_B};
use deepage_core::error::{BenchError, BenchResult};
use deepage_core::plan::MIN_ITERATIONS;

pub const MIN_RETRY_BACKOFF_MS: u64 = 100;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct Config {
    pub bench: BenchConfig,
    pub http: HttpConfig,
    pub report: ReportConfig,
}

/// Workload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct BenchConfig {
    /// Documents written per index.
    pub iterations: usize,
    /// Searches issued per index.
    pub search_queries: usize,
    pub search_limit: usize,
    pub index_prefix: String,
    pub seed_a: u32,
    pub seed_b: u32,
}

/// Service endpoint and retry behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub retry_backoff_ms: u64,
    pub health_timeout_secs: u64,
}

/// Where results land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct ReportConfig {
    pub results_dir: PathBuf,
    pub readme_path: PathBuf,
    pub update_readme: bool,
}

// --- Defaults ---

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: 500,
            search_queries: 750,
            search_limit: 10,
            index_prefix: "deepage".into(),
            seed_a: DEFAULT_SEED_A,
            seed_b: DEFAULT_SEED_B,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:6060".into(),
            timeout_ms: 15_000,
            retries: 6,
            retry_backoff_ms: 1000,
            health_timeout_secs: 120,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            readme_path: PathBuf::from("README.md"),
            update_readme: true,
        }
    }
}

/// A positive integer, or nothing.
fn positive<T: std::str::FromStr + PartialOrd + Default>(raw: Option<String>) -> Option<T> {
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}

impl Config {
    /// Overlay environment variables. Unparsable or non-positive numbers are
    /// ignored; empty strings leave text settings untouched.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DEEPAGE_BASE_URL").filter(|v| !v.is_empty()) {
            self.http.base_url = url;
        }
        if let Some(v) = positive(lookup("BENCH_ITERATIONS")) {
            self.bench.iterations = v;
        }
        if let Some(v) = positive(lookup("BENCH_SEARCH_QUERIES")) {
            self.bench.search_queries = v;
        }
        if let Some(v) = positive(lookup("BENCH_HTTP_TIMEOUT_MS")) {
            self.http.timeout_ms = v;
        }
        if let Some(v) = positive(lookup("BENCH_HTTP_RETRIES")) {
            self.http.retries = v;
        }
        if let Some(v) = positive(lookup("BENCH_HTTP_RETRY_BACKOFF_MS")) {
            self.http.retry_backoff_ms = v;
        }
        if let Some(v) = positive(lookup("BENCH_SEARCH_LIMIT")) {
            self.bench.search_limit = v;
        }
        if let Some(prefix) = lookup("BENCH_INDEX_PREFIX").filter(|v| !v.is_empty()) {
            self.bench.index_prefix = prefix;
        }
    }

    /// Clamp soft limits and reject settings a run cannot start with.
    pub fn validate(&mut self) -> BenchResult<()> {
        self.http.retry_backoff_ms = self.http.retry_backoff_ms.max(MIN_RETRY_BACKOFF_MS);
        if self.bench.iterations < MIN_ITERATIONS {
            return Err(BenchError::Config(format!(
                "--iterations must be at least {MIN_ITERATIONS}, got {}",
                self.bench.iterations
            )));
        }
        if self.bench.search_limit == 0 {
            return Err(BenchError::Config("--search-limit must be at least 1".into()));
        }
        if self.http.base_url.trim().is_empty() {
            return Err(BenchError::Config("base URL is empty".into()));
        }
        Ok(())
    }

    pub fn settings(&self) -> BenchSettings {
        BenchSettings {
            iterations: self.bench.iterations,
            search_queries: self.bench.search_queries,
            search_limit: self.bench.search_limit,
        }
    }
}

/// Load config from disk, then overlay the process environment.
pub fn load_config() -> Result<Config> {
    let mut config = read_config_file()?;
    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

fn read_config_file() -> Result<Config> {
    if let Some(p) = config_path() {
        if p.exists() {
            let content =
                std::fs::read_to_string(&p).with_context(|| format!("reading {}", p.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("parsing {}", p.display()))?;
            return Ok(config);
        }
    }
    Ok(Config::default())
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("DEEPAGE_CONFIG") {
        return Some(PathBuf::from(p));
    }
    directories::BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".config")
            .join("deepage")
            .join("config.toml")
    })
}

/// Show the active config path (for `deepage config`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}
