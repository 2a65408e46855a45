//! Test frontchannel routes.

use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use bca_auth::inspect_auth_token;
use bca_core::SubjectAttributes;

use crate::{ApiError, AppState};

/// Body of a login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Authenticator that produced the identity.
    pub authenticator: &'static str,
    /// Authenticated identity.
    pub identity: SubjectAttributes,
}

/// Form posted to the auth-done endpoint.
#[derive(Debug, Deserialize)]
pub struct AuthDoneForm {
    /// Token obtained by the out-of-band authentication.
    pub token: Option<String>,
}

/// `GET /v1/frontchannel/login`
pub async fn login(State(state): State<AppState>) -> Result<Json<LoginResponse>, ApiError> {
    let attributes = state.frontchannel.authenticate().await?;

    Ok(Json(LoginResponse {
        authenticator: state.frontchannel.name(),
        identity: attributes.subject,
    }))
}

/// `POST /auth-done`
///
/// A missing or unparsable form is treated as a post without a token.
pub async fn auth_done(form: Result<Form<AuthDoneForm>, FormRejection>) -> Json<serde_json::Value> {
    let token = form.ok().and_then(|Form(form)| form.token);
    Json(inspect_auth_token(token.as_deref()).into_json())
}
