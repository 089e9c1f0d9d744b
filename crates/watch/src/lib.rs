//! Run watching: authoritative status polling composed with the live
//! event stream into a single view.
//!
//! The binary entrypoint lives in `main.rs`; the library modules are
//! re-exported for integration testing and for embedding the view in
//! other frontends.

pub mod config;
pub mod poller;
pub mod render;
pub mod view;

pub use poller::{StatusPoller, StatusSource, DEFAULT_POLL_INTERVAL};
pub use view::{ResultPane, RunSnapshot, RunView, ViewConfig};
