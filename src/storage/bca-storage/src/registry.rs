//! Request registry.
//!
//! Owns the mapping from request id to the subject being authenticated and
//! the instant the request was created. Records are immutable once stored.

use std::collections::HashMap;
use std::time::SystemTime;

use tokio::sync::RwLock;
use tracing::debug;

use crate::StorageError;

/// A registered backchannel authentication request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// Subject (user) being authenticated.
    pub subject: String,
    /// When the request was created.
    pub started_at: SystemTime,
}

/// Concurrent map of request id to [`RequestRecord`].
#[derive(Debug, Default)]
pub struct RequestRegistry {
    entries: RwLock<HashMap<String, RequestRecord>>,
}

impl RequestRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new request.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyExists`] if `id` is already registered.
    /// The existing record is left untouched.
    pub async fn put(
        &self,
        id: &str,
        subject: &str,
        started_at: SystemTime,
    ) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(id) {
            return Err(StorageError::AlreadyExists(id.to_string()));
        }

        entries.insert(
            id.to_string(),
            RequestRecord {
                subject: subject.to_string(),
                started_at,
            },
        );
        debug!(auth_req_id = %id, "Request registered");
        Ok(())
    }

    /// Returns the record for `id`, if registered.
    pub async fn get(&self, id: &str) -> Option<RequestRecord> {
        self.entries.read().await.get(id).cloned()
    }

    /// Checks whether `id` is registered.
    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.contains_key(id)
    }

    /// Removes and returns the record for `id`.
    pub async fn remove(&self, id: &str) -> Option<RequestRecord> {
        self.entries.write().await.remove(id)
    }

    /// Removes every request created at or before `cutoff`.
    ///
    /// Returns the ids that were removed.
    pub async fn remove_started_at_or_before(&self, cutoff: SystemTime) -> Vec<String> {
        let mut entries = self.entries.write().await;
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, record)| record.started_at <= cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            entries.remove(id);
        }
        stale
    }

    /// Number of registered requests.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if no request is registered.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
