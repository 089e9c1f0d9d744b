//! WebSocket endpoint for a single run's event stream.
//!
//! [`StreamEndpoint`] holds the address derivation for one run. Call
//! [`StreamEndpoint::connect`] to open a live WebSocket to it.

use tokio_tungstenite::{connect_async, MaybeTlsStream};

use crewdeck_core::types::RunId;

/// The raw socket type used throughout this crate.
pub type WsStream =
    tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Address of one run's event stream.
///
/// The URL is derived deterministically from the WebSocket base URL
/// and the run identifier; nothing else goes into the handshake.
pub struct StreamEndpoint {
    ws_base: String,
    run_id: RunId,
}

/// Errors that can occur while opening the stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Failed to establish the WebSocket connection.
    #[error("connection error: {0}")]
    Connect(String),
}

impl StreamEndpoint {
    /// Create an endpoint for one run.
    ///
    /// * `ws_base` - WebSocket base URL, e.g. `ws://localhost:8000`.
    /// * `run_id`  - the run to subscribe to.
    pub fn new(ws_base: impl Into<String>, run_id: RunId) -> Self {
        Self {
            ws_base: ws_base.into(),
            run_id,
        }
    }

    /// The run this endpoint is scoped to.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Full stream URL for this run.
    pub fn url(&self) -> String {
        format!("{}/ws/runs/{}", self.ws_base.trim_end_matches('/'), self.run_id)
    }

    /// Open the WebSocket connection.
    pub async fn connect(&self) -> Result<WsStream, StreamError> {
        let url = self.url();

        let (ws_stream, _response) = connect_async(&url)
            .await
            .map_err(|e| StreamError::Connect(format!("failed to connect to {url}: {e}")))?;

        tracing::info!(run_id = %self.run_id, url = %url, "Connected to run event stream");

        Ok(ws_stream)
    }
}
