//! Optional exponential-backoff reconnection for run streams.
//!
//! The platform's feed observed in the wild is single-shot: the server
//! closes the socket when the run ends and clients do not retry.
//! Reconnection therefore ships disabled and is opted into via
//! [`ReconnectConfig::enabled`] for deployments where streams drop
//! mid-run.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::connection::{StreamEndpoint, WsStream};

/// Tunable parameters for the reconnect strategy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Whether to reconnect at all. Off by default.
    pub enabled: bool,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// A config with reconnection switched on and default backoff.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }
}

/// Next backoff delay, clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Keep retrying the endpoint with growing delays until a connection
/// succeeds or the token is cancelled.
///
/// Returns `Some(stream)` on success, `None` when cancelled first.
pub async fn reconnect_loop(
    endpoint: &StreamEndpoint,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<WsStream> {
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        tracing::info!(
            run_id = %endpoint.run_id(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to run stream",
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(run_id = %endpoint.run_id(), "Reconnect cancelled");
                return None;
            }
            result = endpoint.connect() => {
                match result {
                    Ok(stream) => {
                        tracing::info!(run_id = %endpoint.run_id(), attempt, "Run stream reconnected");
                        return Some(stream);
                    }
                    Err(e) => {
                        tracing::warn!(
                            run_id = %endpoint.run_id(),
                            error = %e,
                            "Reconnect attempt {attempt} failed",
                        );
                    }
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        delay = next_delay(delay, config);
    }
}
