/// Opaque identifier naming one crew run.
///
/// Assigned by the platform at submission time and never interpreted
/// client-side; it scopes both the status endpoint and the event
/// stream for that run.
pub type RunId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
