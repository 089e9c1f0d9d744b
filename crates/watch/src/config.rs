//! Watcher configuration loaded from environment variables.

use std::time::Duration;

use crate::poller::DEFAULT_POLL_INTERVAL;

/// Environment-derived configuration for the watcher binary.
///
/// All fields have defaults suitable for a local platform instance.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Platform HTTP base URL (default: `http://localhost:8000`).
    pub api_base: String,
    /// Bearer token for API calls. Optional -- unauthenticated calls
    /// fail with an authorization error the watcher surfaces.
    pub token: Option<String>,
    /// Status polling cadence (default: 5 seconds).
    pub poll_interval: Duration,
}

impl WatchConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `CREWDECK_API_URL`            | `http://localhost:8000` |
    /// | `CREWDECK_TOKEN`              | (none)                  |
    /// | `CREWDECK_POLL_INTERVAL_SECS` | `5`                     |
    pub fn from_env() -> Self {
        let api_base = std::env::var("CREWDECK_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".into());

        let token = std::env::var("CREWDECK_TOKEN").ok().filter(|t| !t.is_empty());

        let poll_interval = std::env::var("CREWDECK_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Self {
            api_base,
            token,
            poll_interval,
        }
    }
}
