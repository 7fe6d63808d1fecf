//! Startup helpers for the alert-tasks binary.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing from the `ALERTS_LOG` environment variable.
///
/// Defaults to "info" level if `ALERTS_LOG` is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run `connect` until it succeeds, doubling the delay between attempts.
///
/// Gives up after `max_attempts` and returns the last error.
pub async fn connect_with_retry<T, E, F, Fut>(
    service_name: &str,
    max_attempts: u32,
    connect: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    const INITIAL_DELAY: Duration = Duration::from_millis(100);
    const MAX_DELAY: Duration = Duration::from_secs(5);

    let mut delay = INITIAL_DELAY;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match connect().await {
            Ok(client) => {
                info!(service = service_name, attempt, "Connected");
                return Ok(client);
            }
            Err(e) if attempt < max_attempts => {
                warn!(
                    service = service_name,
                    attempt,
                    max_attempts,
                    error = %e,
                    retry_in = ?delay,
                    "Connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, MAX_DELAY);
            }
            Err(e) => {
                error!(
                    service = service_name,
                    attempts = attempt,
                    error = %e,
                    "Giving up on connection"
                );
                return Err(e);
            }
        }
    }
}
