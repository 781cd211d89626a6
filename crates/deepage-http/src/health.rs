use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use deepage_core::error::{BenchError, BenchResult};
use deepage_core::service::MemoryService;

pub const DEFAULT_HEALTH_DEADLINE: Duration = Duration::from_secs(120);
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_millis(1500);

/// Poll `health()` until the service reports healthy or `deadline` passes.
///
/// On timeout the error carries whatever went wrong last, either the
/// transport failure or the unexpected status text.
pub fn wait_for_health<S: MemoryService + ?Sized>(
    service: &S,
    deadline: Duration,
    interval: Duration,
) -> BenchResult<()> {
    let until = Instant::now() + deadline;
    let mut last_error = String::new();

    while Instant::now() < until {
        match service.health() {
            Ok(status) if status.is_healthy() => {
                info!(url = %service.describe(), "service healthy");
                return Ok(());
            }
            Ok(status) => last_error = format!("unexpected health response: {}", status.status),
            Err(e) => last_error = e.to_string(),
        }
        debug!("health check pending: {last_error}");
        thread::sleep(interval);
    }

    Err(BenchError::HealthTimeout {
        base_url: service.describe(),
        last_error,
    })
}
