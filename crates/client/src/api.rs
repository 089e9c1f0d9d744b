//! REST API client for the crew execution platform.
//!
//! Covers the two calls the run watcher relies on: submitting a run
//! and reading a run's authoritative status. Both are bearer-token
//! authenticated; the token itself comes from outside (the client
//! never logs in on its own).

use std::collections::HashMap;

use serde::Deserialize;

use crewdeck_core::status::{RunState, RunStatus};
use crewdeck_core::types::RunId;

/// HTTP client for one platform API endpoint.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Response returned by the run-submission endpoint after a run has
/// been queued. The full record carries more fields; only the ones the
/// watcher needs are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedRun {
    /// Platform-assigned identifier for the new run.
    pub id: RunId,
    /// Initial state (normally `Pending`).
    #[serde(rename = "status")]
    pub state: RunState,
}

/// Errors from the platform API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The session token was missing, expired, or rejected.
    ///
    /// Callers must surface this -- it means the user has to
    /// re-authenticate, and nothing the client can do will fix it.
    #[error("session not authorized (HTTP {status})")]
    Unauthorized {
        /// HTTP status code (401 or 403).
        status: u16,
    },

    /// The platform returned any other non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl ApiClient {
    /// Create a new client for a platform instance.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Attach a bearer token used on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across several instances).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Base HTTP API URL (e.g. `http://localhost:8000`).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// WebSocket base URL derived from the HTTP base URL.
    ///
    /// Swaps the scheme (`http` -> `ws`, `https` -> `wss`) and leaves
    /// the rest of the URL untouched.
    pub fn ws_base(&self) -> String {
        if let Some(rest) = self.base_url.strip_prefix("https") {
            format!("wss{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http") {
            format!("ws{rest}")
        } else {
            self.base_url.clone()
        }
    }

    /// Submit a new run of the given crew.
    ///
    /// `inputs` is the mapping of named free-text inputs the crew's
    /// template expects. Returns the platform-assigned run identifier.
    pub async fn submit_run(
        &self,
        crew_id: i64,
        inputs: &HashMap<String, String>,
    ) -> Result<SubmittedRun, ApiError> {
        let body = serde_json::json!({ "inputs": inputs });

        let response = self
            .authorized(
                self.client
                    .post(format!("{}/api/v1/crews/{}/run", self.base_url, crew_id)),
            )
            .json(&body)
            .send()
            .await?;

        let run: SubmittedRun = Self::parse_response(response).await?;
        tracing::info!(run_id = %run.id, crew_id, "Run submitted");
        Ok(run)
    }

    /// Fetch the authoritative status of a run.
    ///
    /// Safe to call repeatedly: reads of a finalized run are
    /// idempotent and keep reporting the same terminal state.
    pub async fn run_status(&self, run_id: &str) -> Result<RunStatus, ApiError> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/api/v1/crews/runs/{}", self.base_url, run_id)),
            )
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Attach the bearer token to a request, if one is configured.
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or the matching [`ApiError`]
    /// variant on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(error_for_status(status.as_u16(), body));
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Classify a non-2xx status code into an [`ApiError`].
///
/// 401 and 403 become [`ApiError::Unauthorized`] so callers can route
/// the user to re-authentication instead of treating it as a generic
/// request failure.
fn error_for_status(status: u16, body: String) -> ApiError {
    match status {
        401 | 403 => ApiError::Unauthorized { status },
        _ => ApiError::Api { status, body },
    }
}
