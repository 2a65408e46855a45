//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Entry already exists.
    #[error("entry already exists: {0}")]
    AlreadyExists(String),
}
