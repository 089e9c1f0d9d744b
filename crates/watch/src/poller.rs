//! Periodic authoritative status polling.
//!
//! [`StatusPoller`] asks a [`StatusSource`] for the run's status on a
//! fixed interval and holds the latest answer. A successful poll
//! replaces the held status wholesale; a failed poll is logged and the
//! previous status is kept. Polling stops for good once the run is
//! terminal, and on teardown.
//!
//! The source is a trait so tests (and alternative transports) can
//! script it; [`crewdeck_client::ApiClient`] is the production
//! implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crewdeck_client::{ApiClient, ApiError};
use crewdeck_core::status::RunStatus;
use crewdeck_core::types::RunId;

/// Default polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How long `shutdown` waits for the poll task to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything that can answer "what is the status of this run".
///
/// Reads must be idempotent: once a run is terminal, every further
/// fetch reports the same state and output.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, run_id: &str) -> Result<RunStatus, ApiError>;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch_status(&self, run_id: &str) -> Result<RunStatus, ApiError> {
        self.run_status(run_id).await
    }
}

/// Background poller holding the latest authoritative status.
pub struct StatusPoller {
    run_id: RunId,
    status: Arc<RwLock<Option<RunStatus>>>,
    auth_required: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StatusPoller {
    /// Spawn the poll task for `run_id`, ticking every `interval`.
    ///
    /// The first poll fires immediately; subsequent ones follow the
    /// interval.
    pub fn spawn(source: Arc<dyn StatusSource>, run_id: RunId, interval: Duration) -> Self {
        let status: Arc<RwLock<Option<RunStatus>>> = Arc::new(RwLock::new(None));
        let auth_required = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(poll_loop(
            source,
            run_id.clone(),
            interval,
            Arc::clone(&status),
            Arc::clone(&auth_required),
            cancel.clone(),
        ));

        Self {
            run_id,
            status,
            auth_required,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// The run this poller is scoped to.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The most recently held status, if any poll has succeeded yet.
    pub async fn status(&self) -> Option<RunStatus> {
        self.status.read().await.clone()
    }

    /// Whether the last poll was rejected for authorization reasons.
    /// Cleared again by the next successful poll.
    pub fn auth_required(&self) -> bool {
        self.auth_required.load(Ordering::Relaxed)
    }

    /// Stop polling and wait for the task to exit.
    ///
    /// Safe to call more than once, and safe even if no poll ever
    /// completed.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        if let Some(handle) = self.task.lock().await.take() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(run_id = %self.run_id, error = %e, "Poll task join failed");
                }
                Err(_) => {
                    tracing::warn!(run_id = %self.run_id, "Poll task did not stop in time");
                }
            }
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Poll loop: tick, fetch, replace. Exits on terminal status or
/// cancellation; individual fetch failures keep the loop alive.
async fn poll_loop(
    source: Arc<dyn StatusSource>,
    run_id: RunId,
    interval: Duration,
    status: Arc<RwLock<Option<RunStatus>>>,
    auth_required: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    tracing::debug!(
        run_id = %run_id,
        interval_ms = interval.as_millis() as u64,
        "Status poller started",
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = source.fetch_status(&run_id) => result,
        };

        match result {
            Ok(new_status) => {
                auth_required.store(false, Ordering::Relaxed);
                let terminal = new_status.state.is_terminal();
                *status.write().await = Some(new_status);

                if terminal {
                    tracing::info!(run_id = %run_id, "Run is terminal; polling stopped");
                    return;
                }
            }
            Err(ApiError::Unauthorized { status: code }) => {
                auth_required.store(true, Ordering::Relaxed);
                tracing::warn!(
                    run_id = %run_id,
                    status = code,
                    "Status poll rejected: session requires re-authentication",
                );
            }
            Err(e) => {
                tracing::warn!(run_id = %run_id, error = %e, "Status poll failed; keeping last status");
            }
        }
    }
}
