//! # BCA API
//!
//! REST layer for the BCA test authenticator.
//!
//! ## Endpoints
//!
//! - `/v1/backchannel/authentications/*` - Start, poll and cancel backchannel requests
//! - `/v1/frontchannel/login` - Auto-login frontchannel authenticator
//! - `/auth-done` - Echo the claims of a posted JWT
//! - `/v1/sys/health` - Health and request count

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use bca_auth::Authenticator;
use bca_core::BackchannelAuthenticationHandler;

pub use error::ApiError;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Backchannel request lifecycle.
    pub backchannel: Arc<dyn BackchannelAuthenticationHandler>,
    /// Frontchannel authenticator.
    pub frontchannel: Arc<dyn Authenticator>,
    /// Name of the linked frontchannel authenticator, reported on health.
    pub frontchannel_authenticator: Option<String>,
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/sys/health", get(handlers::sys::health))
        .route(
            "/v1/backchannel/authentications",
            post(handlers::backchannel::start),
        )
        .route(
            "/v1/backchannel/authentications/{auth_req_id}",
            get(handlers::backchannel::status).delete(handlers::backchannel::cancel),
        )
        .route("/v1/frontchannel/login", get(handlers::frontchannel::login))
        .route("/auth-done", post(handlers::frontchannel::auth_done))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Mirrors the caller's origin and allows credentials.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::OPTIONS,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::WWW_AUTHENTICATE,
            header::CONTENT_TYPE,
        ])
}
