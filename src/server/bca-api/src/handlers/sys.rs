//! System endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Body of `GET /v1/sys/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is serving.
    pub status: &'static str,
    /// Server version.
    pub version: &'static str,
    /// Backchannel handler name.
    pub handler: &'static str,
    /// Requests currently tracked.
    pub pending_requests: usize,
    /// Linked frontchannel authenticator, if configured.
    pub frontchannel_authenticator: Option<String>,
}

/// `GET /v1/sys/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        handler: state.backchannel.name(),
        pending_requests: state.backchannel.pending_requests().await,
        frontchannel_authenticator: state.frontchannel_authenticator.clone(),
    })
}
