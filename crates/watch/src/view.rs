//! Run view coordinator.
//!
//! [`RunView`] composes the live event stream and the status poller
//! for one run. The two subsystems share nothing but the run
//! identifier and are reconciled only at render time, in
//! [`RunView::snapshot`]: the event log answers "what happened, in
//! what order", the polled status answers "is it done and what came
//! out".

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crewdeck_core::status::{RunState, RunStatus};
use crewdeck_core::types::RunId;
use crewdeck_stream::{ConnectionHealth, EventLog, ReconnectConfig, RunStream, StreamConfig};

use crate::poller::{StatusPoller, StatusSource, DEFAULT_POLL_INTERVAL};
use crate::render;

/// Configuration for one run view.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// WebSocket base URL for the event stream.
    pub ws_base: String,
    /// Status polling cadence.
    pub poll_interval: Duration,
    /// Stream reconnect policy.
    pub reconnect: ReconnectConfig,
    /// Optional cap on retained timeline entries. Unbounded when
    /// `None`; a capped log keeps the most recent entries.
    pub log_capacity: Option<usize>,
}

impl ViewConfig {
    pub fn new(ws_base: impl Into<String>) -> Self {
        Self {
            ws_base: ws_base.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            reconnect: ReconnectConfig::default(),
            log_capacity: None,
        }
    }
}

/// The final-result pane, gated on authoritative status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPane {
    /// No status yet, or the run is still Pending/Running.
    Pending,
    /// The run completed; this is its output.
    Output(String),
    /// The run failed; `detail` carries partial output or an error
    /// summary when the platform recorded one.
    Failed { detail: Option<String> },
}

impl ResultPane {
    /// Whether the pane reflects a terminal run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResultPane::Pending)
    }
}

/// Everything a renderer needs for one frame of the run screen.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    /// Rendered timeline lines, oldest first.
    pub timeline: Vec<String>,
    /// Stream connection health.
    pub health: ConnectionHealth,
    /// Advisory flag: the stream saw a `completed`/`failed` event.
    pub stream_reports_terminal: bool,
    /// Authoritative result pane.
    pub result: ResultPane,
    /// The session was rejected and needs re-authentication.
    pub auth_required: bool,
}

/// One run's screen: live timeline plus authoritative result.
pub struct RunView {
    run_id: RunId,
    log: Arc<EventLog>,
    stream: RunStream,
    poller: StatusPoller,
}

impl RunView {
    /// Create the view: spawns the stream and the poller for `run_id`.
    pub fn open(run_id: RunId, source: Arc<dyn StatusSource>, config: ViewConfig) -> Self {
        let log = Arc::new(match config.log_capacity {
            Some(capacity) => EventLog::with_capacity(capacity),
            None => EventLog::new(),
        });

        let stream = RunStream::spawn(
            StreamConfig {
                ws_base: config.ws_base,
                reconnect: config.reconnect,
            },
            run_id.clone(),
            Arc::clone(&log),
        );
        let poller = StatusPoller::spawn(source, run_id.clone(), config.poll_interval);

        tracing::info!(run_id = %run_id, "Run view opened");

        Self {
            run_id,
            log,
            stream,
            poller,
        }
    }

    /// The run this view is scoped to.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Current stream connection health.
    pub fn health(&self) -> ConnectionHealth {
        self.stream.health()
    }

    /// Subscribe to timeline append notifications (for auto-scroll /
    /// incremental printing).
    pub fn subscribe_timeline(&self) -> watch::Receiver<u64> {
        self.log.subscribe()
    }

    /// Render the current state of both subsystems.
    ///
    /// The stream and the poller update independently and in any
    /// order; this is the only place their views of the run meet.
    pub async fn snapshot(&self) -> RunSnapshot {
        let events = self.log.all().await;
        let timeline = events.iter().map(render::timeline_line).collect();
        let status = self.poller.status().await;

        RunSnapshot {
            timeline,
            health: self.stream.health(),
            stream_reports_terminal: self.stream.saw_terminal(),
            result: result_pane(status.as_ref()),
            auth_required: self.poller.auth_required(),
        }
    }

    /// The currently held final output, for the copy action.
    ///
    /// A pure read of the polled status; calling it changes nothing.
    pub async fn output(&self) -> Option<String> {
        self.poller.status().await.and_then(|status| status.output)
    }

    /// The currently held authoritative status record.
    pub async fn status(&self) -> Option<RunStatus> {
        self.poller.status().await
    }

    /// Tear down both subsystems.
    ///
    /// Must run on every exit path. Idempotent: closing an
    /// already-closed view (or one still connecting) is a no-op.
    pub async fn close(&self) {
        self.stream.shutdown().await;
        self.poller.shutdown().await;
        tracing::info!(run_id = %self.run_id, "Run view closed");
    }
}

/// Gate the result pane on the authoritative state.
fn result_pane(status: Option<&RunStatus>) -> ResultPane {
    match status {
        None => ResultPane::Pending,
        Some(status) => match status.state {
            RunState::Pending | RunState::Running => ResultPane::Pending,
            RunState::Completed => ResultPane::Output(
                status
                    .output
                    .clone()
                    .unwrap_or_else(|| "(no output recorded)".to_string()),
            ),
            RunState::Failed => ResultPane::Failed {
                detail: status.output.clone(),
            },
        },
    }
}
