//! Request state tracker.
//!
//! Remembers which requests have been polled at least once. The outcome of
//! later polls is recomputed from the registry record and configuration, so
//! the "seen before" marker is the only state kept here.

use std::collections::HashMap;
use std::time::SystemTime;

use tokio::sync::RwLock;

/// Marker stored for a request after its first poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedRequest {
    /// When the first poll happened.
    pub first_polled_at: SystemTime,
}

/// Concurrent map of request id to [`TrackedRequest`].
#[derive(Debug, Default)]
pub struct StateTracker {
    seen: RwLock<HashMap<String, TrackedRequest>>,
}

impl StateTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as polled.
    ///
    /// Returns `true` only for the caller that inserted the marker. Concurrent
    /// first polls of the same id see exactly one `true`.
    pub async fn mark_started(&self, id: &str, now: SystemTime) -> bool {
        let mut seen = self.seen.write().await;
        if seen.contains_key(id) {
            return false;
        }
        seen.insert(
            id.to_string(),
            TrackedRequest {
                first_polled_at: now,
            },
        );
        true
    }

    /// Returns the marker for `id`, if it has been polled.
    pub async fn get(&self, id: &str) -> Option<TrackedRequest> {
        self.seen.read().await.get(id).copied()
    }

    /// Forgets `id`. Returns `true` if a marker was removed.
    pub async fn remove(&self, id: &str) -> bool {
        self.seen.write().await.remove(id).is_some()
    }

    /// Number of tracked requests.
    pub async fn len(&self) -> usize {
        self.seen.read().await.len()
    }

    /// Returns `true` if no request is tracked.
    pub async fn is_empty(&self) -> bool {
        self.seen.read().await.is_empty()
    }
}
