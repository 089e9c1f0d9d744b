//! Append-only event log backing the live timeline.
//!
//! [`EventLog`] stores received events in arrival order. `append` is
//! the only mutator; entries are never reordered or edited after the
//! fact. Each append bumps a [`tokio::sync::watch`] counter so a
//! renderer can wake up and scroll to the newest entry.

use std::collections::VecDeque;

use tokio::sync::{watch, RwLock};

use crate::event::ProgressEvent;

/// Ordered, append-only store of progress events for one run view.
pub struct EventLog {
    entries: RwLock<VecDeque<ProgressEvent>>,
    /// When set, the log drops its oldest entries beyond this length.
    capacity: Option<usize>,
    appended: watch::Sender<u64>,
}

impl EventLog {
    /// Create an unbounded log.
    pub fn new() -> Self {
        let (appended, _) = watch::channel(0);
        Self {
            entries: RwLock::new(VecDeque::new()),
            capacity: None,
            appended,
        }
    }

    /// Create a log that retains at most `capacity` entries, dropping
    /// the oldest ones first. Ordering of the survivors is preserved.
    pub fn with_capacity(capacity: usize) -> Self {
        let (appended, _) = watch::channel(0);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity: Some(capacity),
            appended,
        }
    }

    /// Append one event to the end of the log and notify subscribers.
    pub async fn append(&self, event: ProgressEvent) {
        {
            let mut entries = self.entries.write().await;
            entries.push_back(event);
            if let Some(capacity) = self.capacity {
                while entries.len() > capacity {
                    entries.pop_front();
                }
            }
        }
        self.appended.send_modify(|count| *count += 1);
    }

    /// The full ordered contents, oldest first.
    pub async fn all(&self) -> Vec<ProgressEvent> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// Number of entries currently retained.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Subscribe to append notifications.
    ///
    /// The watched value is the total number of appends so far (not
    /// the retained length -- a capped log keeps counting).
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.appended.subscribe()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
