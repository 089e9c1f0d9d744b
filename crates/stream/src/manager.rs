//! Per-run stream lifecycle management.
//!
//! [`RunStream`] owns the connection task for one run: it connects,
//! pumps frames into the shared [`EventLog`], tracks
//! [`ConnectionHealth`], optionally reconnects, and tears everything
//! down on [`RunStream::shutdown`]. Teardown is idempotent and safe to
//! call while the connection is still being established.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crewdeck_core::types::RunId;

use crate::connection::StreamEndpoint;
use crate::event::ProgressEvent;
use crate::log::EventLog;
use crate::processor::{pump_events, PumpExit};
use crate::reconnect::{reconnect_loop, ReconnectConfig};

/// Message of the synthetic notice appended when the stream opens.
pub const STREAM_ACTIVE_NOTICE: &str = "live event stream active";

/// Message of the synthetic notice appended when the stream closes.
pub const STREAM_CLOSED_NOTICE: &str = "event stream closed";

/// How long `shutdown` waits for the connection task to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Health of the stream connection, independent of run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    Connecting,
    Connected,
    Closed,
}

/// Configuration for one run stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket base URL, e.g. `ws://localhost:8000`.
    pub ws_base: String,
    /// Reconnect policy. Disabled by default.
    pub reconnect: ReconnectConfig,
}

impl StreamConfig {
    /// Config with the default (single-shot) reconnect policy.
    pub fn new(ws_base: impl Into<String>) -> Self {
        Self {
            ws_base: ws_base.into(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// A live (or finished) event stream for one run.
pub struct RunStream {
    run_id: RunId,
    health_rx: watch::Receiver<ConnectionHealth>,
    saw_terminal: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl RunStream {
    /// Spawn the connection task for `run_id`, appending everything it
    /// receives into `log`.
    pub fn spawn(config: StreamConfig, run_id: RunId, log: Arc<EventLog>) -> Self {
        let endpoint = StreamEndpoint::new(config.ws_base, run_id.clone());
        let (health_tx, health_rx) = watch::channel(ConnectionHealth::Connecting);
        let saw_terminal = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_stream_task(
            endpoint,
            config.reconnect,
            log,
            health_tx,
            Arc::clone(&saw_terminal),
            cancel.clone(),
        ));

        Self {
            run_id,
            health_rx,
            saw_terminal,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// The run this stream is scoped to.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Current connection health.
    pub fn health(&self) -> ConnectionHealth {
        *self.health_rx.borrow()
    }

    /// Subscribe to health changes.
    pub fn health_watch(&self) -> watch::Receiver<ConnectionHealth> {
        self.health_rx.clone()
    }

    /// Whether a `completed`/`failed` event has been seen on the
    /// stream. Advisory only -- the status poller owns the answer to
    /// "is the run actually done".
    pub fn saw_terminal(&self) -> bool {
        self.saw_terminal.load(Ordering::Relaxed)
    }

    /// Stop the connection task and wait for it to exit.
    ///
    /// Safe to call more than once, and safe to call while the stream
    /// is still connecting; no events are appended after this returns.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        if let Some(handle) = self.task.lock().await.take() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(run_id = %self.run_id, error = %e, "Stream task join failed");
                }
                Err(_) => {
                    tracing::warn!(run_id = %self.run_id, "Stream task did not stop in time");
                }
            }
        }
    }
}

impl Drop for RunStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Connection task: connect, pump, reconnect (when enabled), close.
async fn run_stream_task(
    endpoint: StreamEndpoint,
    reconnect: ReconnectConfig,
    log: Arc<EventLog>,
    health_tx: watch::Sender<ConnectionHealth>,
    saw_terminal: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    loop {
        let _ = health_tx.send(ConnectionHealth::Connecting);

        let connected = tokio::select! {
            _ = cancel.cancelled() => None,
            result = endpoint.connect() => match result {
                Ok(stream) => Some(stream),
                Err(e) => {
                    tracing::warn!(run_id = %endpoint.run_id(), error = %e, "Stream connection failed");
                    log.append(ProgressEvent::transport_error(e.to_string())).await;
                    if reconnect.enabled {
                        reconnect_loop(&endpoint, &reconnect, &cancel).await
                    } else {
                        None
                    }
                }
            },
        };

        let Some(mut stream) = connected else { break };

        let _ = health_tx.send(ConnectionHealth::Connected);
        log.append(ProgressEvent::notice(STREAM_ACTIVE_NOTICE)).await;

        let exit = pump_events(&mut stream, &log, &saw_terminal, &cancel).await;

        log.append(ProgressEvent::notice(STREAM_CLOSED_NOTICE)).await;
        let _ = health_tx.send(ConnectionHealth::Closed);

        if exit == PumpExit::Cancelled
            || cancel.is_cancelled()
            || saw_terminal.load(Ordering::Relaxed)
            || !reconnect.enabled
        {
            return;
        }

        tracing::info!(run_id = %endpoint.run_id(), "Run stream lost, retrying");
    }

    // Never reached a live session: still record the close so the
    // timeline and health reflect the teardown.
    log.append(ProgressEvent::notice(STREAM_CLOSED_NOTICE)).await;
    let _ = health_tx.send(ConnectionHealth::Closed);
}
