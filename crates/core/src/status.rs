//! Authoritative run status as reported by the platform API.
//!
//! The status record is the source of truth for "is the run done" and
//! for the final output. Live stream events only describe what
//! happened along the way.

use serde::{Deserialize, Serialize};

use crate::types::{RunId, Timestamp};

/// Lifecycle state of a crew run.
///
/// Transitions are monotonic: `Pending -> Running -> {Completed,
/// Failed}`. Once a run reaches a terminal state, subsequent status
/// reads report the same state and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunState {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// One authoritative status record for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    pub id: RunId,
    #[serde(rename = "status")]
    pub state: RunState,
    /// Final output text. Present once the run completes; a failed run
    /// may carry partial output or an error summary.
    #[serde(default)]
    pub output: Option<String>,
    pub created_at: Timestamp,
    /// Set iff the run has reached a terminal state.
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_and_running_are_not_terminal() {
        assert!(!RunState::Pending.is_terminal());
        assert!(!RunState::Running.is_terminal());
    }

    #[test]
    fn completed_and_failed_are_terminal() {
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed.is_terminal());
    }

    #[test]
    fn deserialize_running_status_without_output() {
        let json = r#"{
            "id": "run-123",
            "status": "RUNNING",
            "created_at": "2026-08-07T10:00:00Z"
        }"#;
        let status: RunStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.id, "run-123");
        assert_eq!(status.state, RunState::Running);
        assert!(status.output.is_none());
        assert!(status.completed_at.is_none());
    }

    #[test]
    fn deserialize_completed_status_with_output() {
        let json = r#"{
            "id": "run-123",
            "status": "COMPLETED",
            "output": "Report ready",
            "created_at": "2026-08-07T10:00:00Z",
            "completed_at": "2026-08-07T10:05:00Z"
        }"#;
        let status: RunStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.state, RunState::Completed);
        assert_eq!(status.output.as_deref(), Some("Report ready"));
        assert!(status.completed_at.is_some());
    }
}
