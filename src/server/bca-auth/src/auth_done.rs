//! Auth-done token inspection.
//!
//! A test counterpart for the step that completes an out-of-band
//! authentication: the caller posts the token it obtained and gets the token's
//! claims back. The signature is not checked.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};
use tracing::debug;

use crate::AuthError;

/// Outcome of inspecting a posted auth token.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthDoneOutcome {
    /// Claims decoded from the token payload.
    Claims(Map<String, Value>),
    /// The token could not be inspected.
    Failed {
        /// Human-readable reason.
        reason: String,
    },
}

impl AuthDoneOutcome {
    /// JSON body returned to the caller.
    ///
    /// Failures carry `sub` and `acr` set to `"fail"` plus a `reason`.
    pub fn into_json(self) -> Value {
        match self {
            AuthDoneOutcome::Claims(claims) => Value::Object(claims),
            AuthDoneOutcome::Failed { reason } => serde_json::json!({
                "sub": "fail",
                "acr": "fail",
                "reason": reason,
            }),
        }
    }
}

/// Inspects an auth token posted to the auth-done endpoint.
pub fn inspect_auth_token(token: Option<&str>) -> AuthDoneOutcome {
    match decode_claims(token) {
        Ok(claims) => AuthDoneOutcome::Claims(claims),
        Err(e) => {
            debug!(error = %e, "Auth-done token rejected");
            let reason = match e {
                AuthError::MissingToken => "no auth token in post".to_string(),
                other => other.to_string(),
            };
            AuthDoneOutcome::Failed { reason }
        },
    }
}

/// Decodes the payload of a compact JWT without verifying it.
fn decode_claims(token: Option<&str>) -> Result<Map<String, Value>, AuthError> {
    let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)?;

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::NotAJwt);
    }

    // Accept both alphabets, with or without padding
    let payload = parts[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .map_err(|e| AuthError::UndecodablePayload(e.to_string()))?;

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(AuthError::UndecodablePayload(
            "payload is not a JSON object".into(),
        )),
        Err(e) => Err(AuthError::UndecodablePayload(e.to_string())),
    }
}
