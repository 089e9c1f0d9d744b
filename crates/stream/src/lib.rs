//! Live run event stream consumer.
//!
//! Connects to the platform's per-run WebSocket feed, decodes each
//! inbound frame into a typed progress event, and appends it to an
//! append-only event log in arrival order. Tracks connection health,
//! flags terminal-looking events, and supports optional
//! exponential-backoff reconnection.
//!
//! The stream is deliberately defensive: a frame that cannot be
//! decoded becomes a visible notice event instead of an error, and
//! teardown is idempotent and never panics.

pub mod connection;
pub mod event;
pub mod log;
pub mod manager;
pub mod processor;
pub mod reconnect;

pub use event::{EventKind, EventPayload, ProgressEvent};
pub use log::EventLog;
pub use manager::{ConnectionHealth, RunStream, StreamConfig};
pub use reconnect::ReconnectConfig;
