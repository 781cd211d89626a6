use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("config error: {0}")]
    Config(String),

    #[error("health check timed out for {base_url}. Last error: {last_error}")]
    HealthTimeout { base_url: String, last_error: String },
}

pub type BenchResult<T> = Result<T, BenchError>;
