//! API error responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

use bca_auth::AuthError;
use bca_core::BackchannelError;

/// Error returned by API handlers.
///
/// Rendered as `{"error": ..., "code": ...}` with the matching status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<BackchannelError> for ApiError {
    fn from(e: BackchannelError) -> Self {
        match e {
            BackchannelError::InvalidRequest(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, e.to_string(), "INVALID_REQUEST")
            },
            BackchannelError::DuplicateRequest(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, e.to_string(), "DUPLICATE_REQUEST")
            },
            BackchannelError::Configuration(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
                "CONFIGURATION_ERROR",
            ),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("invalid request: {}", rejection.body_text()),
            "INVALID_REQUEST",
        )
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Configuration(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
                "CONFIGURATION_ERROR",
            ),
            _ => ApiError::new(StatusCode::UNAUTHORIZED, e.to_string(), "UNAUTHORIZED"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(code = self.code, error = %self.message, "Request failed");
        }

        let body = ErrorBody {
            error: &self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}
