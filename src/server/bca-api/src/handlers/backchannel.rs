//! Backchannel polling endpoint.
//!
//! - `POST /v1/backchannel/authentications` - start
//! - `GET /v1/backchannel/authentications/{auth_req_id}` - check status
//! - `DELETE /v1/backchannel/authentications/{auth_req_id}` - cancel

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use bca_core::{RequestState, SubjectAttributes};

use crate::{ApiError, AppState};

/// Body of a start request.
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    /// Caller-chosen request id.
    pub auth_req_id: String,
    /// Subject to authenticate.
    pub subject: String,
}

/// Acknowledgement of a start request.
#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// Id to poll.
    pub auth_req_id: String,
}

/// Body of a status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Polled request id.
    pub auth_req_id: String,
    /// Current state.
    pub state: RequestState,
    /// Resolved identity, present only when `state` is `SUCCEEDED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<SubjectAttributes>,
}

/// `POST /v1/backchannel/authentications`
///
/// Malformed bodies are answered like any other invalid start request.
pub async fn start(
    State(state): State<AppState>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StartResponse>), ApiError> {
    let Json(req) = payload?;
    state
        .backchannel
        .start_authentication(&req.auth_req_id, &req.subject)
        .await?;

    info!(auth_req_id = %req.auth_req_id, "Backchannel authentication started");
    Ok((
        StatusCode::ACCEPTED,
        Json(StartResponse {
            auth_req_id: req.auth_req_id,
        }),
    ))
}

/// `GET /v1/backchannel/authentications/{auth_req_id}`
pub async fn status(
    State(state): State<AppState>,
    Path(auth_req_id): Path<String>,
) -> Json<StatusResponse> {
    let result = state
        .backchannel
        .check_authentication_status(&auth_req_id)
        .await;

    Json(StatusResponse {
        auth_req_id,
        state: result.state,
        identity: result.attributes.map(|attributes| attributes.subject),
    })
}

/// `DELETE /v1/backchannel/authentications/{auth_req_id}`
pub async fn cancel(State(state): State<AppState>, Path(auth_req_id): Path<String>) -> StatusCode {
    state
        .backchannel
        .cancel_authentication_request(&auth_req_id)
        .await;
    StatusCode::NO_CONTENT
}
