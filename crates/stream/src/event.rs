//! Progress event model for the live run stream.
//!
//! The platform sends JSON text frames shaped like
//! `{"kind": "<kind>", ...payload fields}`. Decoding is total: every
//! frame yields exactly one [`ProgressEvent`], with malformed frames
//! converted into connection notices rather than errors. The stream is
//! operator-controlled but not schema-locked, so unknown kinds and
//! missing fields are normal inputs, not faults.

use serde::Deserialize;
use uuid::Uuid;

use crewdeck_core::types::Timestamp;

/// Classification of a progress event.
///
/// The closed set mirrors what the crew runner emits; anything else
/// lands in [`EventKind::Other`] and is rendered generically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// An agent picked up a task.
    AgentStarted,
    /// An agent reported an intermediate action.
    AgentActing,
    /// A tool invocation began.
    ToolStarted,
    /// A tool invocation finished with output.
    ToolFinished,
    /// A fragment of streamed model output.
    OutputChunk,
    /// The run finished successfully (advisory -- the status poller
    /// stays authoritative for terminal state).
    Completed,
    /// The run failed (advisory, see above).
    Failed,
    /// Client- or transport-level notice (connect, disconnect, decode
    /// failure).
    ConnectionNotice,
    /// A kind this client does not recognize. Carried verbatim.
    Other(String),
}

impl EventKind {
    /// Classify a wire `kind` string.
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "agent_started" => EventKind::AgentStarted,
            "agent_acting" => EventKind::AgentActing,
            "tool_started" => EventKind::ToolStarted,
            "tool_finished" => EventKind::ToolFinished,
            "partial_output_chunk" => EventKind::OutputChunk,
            "completed" => EventKind::Completed,
            "failed" => EventKind::Failed,
            "connection_notice" => EventKind::ConnectionNotice,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// The wire name for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::AgentStarted => "agent_started",
            EventKind::AgentActing => "agent_acting",
            EventKind::ToolStarted => "tool_started",
            EventKind::ToolFinished => "tool_finished",
            EventKind::OutputChunk => "partial_output_chunk",
            EventKind::Completed => "completed",
            EventKind::Failed => "failed",
            EventKind::ConnectionNotice => "connection_notice",
            EventKind::Other(kind) => kind,
        }
    }

    /// Whether this kind claims the run is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Completed | EventKind::Failed)
    }
}

/// Kind-dependent payload fields. All optional -- absence is handled at
/// render time with placeholders, never by failing the decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventPayload {
    /// Agent name, for agent events.
    pub agent: Option<String>,
    /// Free-text description of what happened.
    pub message: Option<String>,
    /// Tool name, for tool events.
    pub tool: Option<String>,
    /// Tool input text.
    pub input: Option<String>,
    /// Tool output text.
    pub output: Option<String>,
    /// Streamed output fragment.
    pub content: Option<String>,
    /// Error text, for failures and transport notices.
    pub error: Option<String>,
}

/// One entry in the live timeline.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Locally generated render key. Unique within one event log,
    /// never used for ordering.
    pub id: Uuid,
    pub kind: EventKind,
    pub payload: EventPayload,
    /// Client-side receipt time. The wire carries no trusted
    /// timestamp, so this is what display ordering labels use.
    pub received_at: Timestamp,
}

/// Raw wire shape of an inbound frame. The `kind` discriminator is
/// optional and `type` is accepted as a legacy alias.
#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(alias = "type")]
    kind: Option<String>,
    #[serde(flatten)]
    payload: EventPayload,
}

impl ProgressEvent {
    /// Build an event from an already-classified kind and payload,
    /// stamping the local id and receipt time.
    pub fn new(kind: EventKind, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            payload,
            received_at: chrono::Utc::now(),
        }
    }

    /// Decode one inbound text frame. Never fails.
    ///
    /// Well-formed JSON is classified by its `kind` field; a frame
    /// without one is kept as an unrecognized event. Malformed JSON
    /// becomes a [`EventKind::ConnectionNotice`] carrying the decode
    /// error, so the problem stays visible in the timeline.
    pub fn decode(text: &str) -> Self {
        match serde_json::from_str::<RawMessage>(text) {
            Ok(raw) => {
                let kind = match raw.kind.as_deref() {
                    Some(kind) => EventKind::from_wire(kind),
                    None => EventKind::Other("unknown".to_string()),
                };
                Self::new(kind, raw.payload)
            }
            Err(e) => {
                tracing::warn!(error = %e, raw_message = %text, "Undecodable stream message");
                Self::new(
                    EventKind::ConnectionNotice,
                    EventPayload {
                        message: Some("received an undecodable stream message".to_string()),
                        error: Some(e.to_string()),
                        ..EventPayload::default()
                    },
                )
            }
        }
    }

    /// Synthetic client-side notice (stream opened, stream closed).
    pub fn notice(message: impl Into<String>) -> Self {
        Self::new(
            EventKind::ConnectionNotice,
            EventPayload {
                message: Some(message.into()),
                ..EventPayload::default()
            },
        )
    }

    /// Synthetic notice for a transport-level failure.
    pub fn transport_error(error: impl Into<String>) -> Self {
        Self::new(
            EventKind::ConnectionNotice,
            EventPayload {
                message: Some("stream connection error".to_string()),
                error: Some(error.into()),
                ..EventPayload::default()
            },
        )
    }

    /// Whether this event claims the run reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}
