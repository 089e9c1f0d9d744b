//! HTTP client for the crew execution platform API.
//!
//! Wraps the platform's REST endpoints (run submission, run status)
//! using [`reqwest`]. The client is an explicitly constructed value --
//! create one per session and pass it where it is needed; there is no
//! global instance.

pub mod api;

pub use api::{ApiClient, ApiError, SubmittedRun};
