pub mod client;
pub mod health;

pub use client::{HttpService, RetryPolicy};
pub use health::{wait_for_health, DEFAULT_HEALTH_DEADLINE, DEFAULT_HEALTH_INTERVAL};
