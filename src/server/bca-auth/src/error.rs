//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during frontchannel authentication.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing authentication token.
    #[error("missing authentication token")]
    MissingToken,

    /// Token is not a three-part JWT.
    #[error("auth token not a jwt")]
    NotAJwt,

    /// Token payload is not base64-encoded JSON.
    #[error("auth token payload not decodable: {0}")]
    UndecodablePayload(String),

    /// Backend configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}
