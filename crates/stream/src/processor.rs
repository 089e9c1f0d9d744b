//! WebSocket frame pump.
//!
//! Reads raw frames from an open run stream, decodes each text frame
//! into a [`ProgressEvent`], and appends it to the [`EventLog`] in
//! arrival order. Terminal-looking kinds raise the advisory flag; the
//! status poller stays authoritative for actual completion.

use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::connection::WsStream;
use crate::event::ProgressEvent;
use crate::log::EventLog;

/// Why the pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The remote closed the socket, or the stream was exhausted.
    Closed,
    /// A transport-level receive error ended the session.
    Errored,
    /// Local teardown cancelled the pump.
    Cancelled,
}

/// Pump frames until the socket closes, a receive error occurs, or the
/// cancellation token fires.
///
/// Cancellation is checked before every append, so once teardown has
/// started no further entries reach the log -- a frame in flight at
/// that moment is dropped, not appended.
pub async fn pump_events(
    ws_stream: &mut WsStream,
    log: &EventLog,
    saw_terminal: &AtomicBool,
    cancel: &CancellationToken,
) -> PumpExit {
    loop {
        let msg_result = tokio::select! {
            _ = cancel.cancelled() => return PumpExit::Cancelled,
            msg = ws_stream.next() => msg,
        };

        match msg_result {
            Some(Ok(Message::Text(text))) => {
                ingest_text(log, saw_terminal, &text).await;
            }
            Some(Ok(Message::Binary(_))) => {
                // The feed is text-only; tolerate stray binary frames.
                tracing::trace!("Ignoring binary frame on run stream");
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                // Handled automatically by tungstenite.
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(?frame, "Run stream closed by remote");
                return PumpExit::Closed;
            }
            Some(Ok(Message::Frame(_))) => {}
            Some(Err(e)) => {
                tracing::error!(error = %e, "Run stream receive error");
                log.append(ProgressEvent::transport_error(e.to_string())).await;
                return PumpExit::Errored;
            }
            None => {
                tracing::info!("Run stream exhausted");
                return PumpExit::Closed;
            }
        }
    }
}

/// Decode one text frame and append it to the log, raising the
/// advisory terminal flag for `completed`/`failed` kinds.
pub async fn ingest_text(log: &EventLog, saw_terminal: &AtomicBool, text: &str) {
    let event = ProgressEvent::decode(text);

    if event.is_terminal() {
        tracing::debug!(kind = event.kind.as_str(), "Stream reports run terminal");
        saw_terminal.store(true, Ordering::Relaxed);
    }

    log.append(event).await;
}
