//! Backchannel authentication error types.

use thiserror::Error;

use bca_storage::StorageError;

/// Errors surfaced to callers of the backchannel state machine.
///
/// Unknown request ids are not errors; they resolve to
/// [`RequestState::Expired`](crate::RequestState::Expired).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackchannelError {
    /// Malformed start request (empty id or subject).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A request with this id is already in flight.
    #[error("duplicate request id: {0}")]
    DuplicateRequest(String),

    /// Invalid policy configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<StorageError> for BackchannelError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::AlreadyExists(id) => BackchannelError::DuplicateRequest(id),
        }
    }
}
