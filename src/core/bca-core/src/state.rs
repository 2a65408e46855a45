//! Request states and poll results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AuthenticationAttributes;

/// Lifecycle state of a backchannel authentication request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    /// Accepted, outcome not yet determined.
    Started,
    /// Resolved positively.
    Succeeded,
    /// Resolved negatively.
    Failed,
    /// Unknown id, or no longer tracked.
    Expired,
}

impl RequestState {
    /// Whether a polling client should stop after seeing this state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestState::Started)
    }

    /// Wire name of the state.
    pub fn as_str(self) -> &'static str {
        match self {
            RequestState::Started => "STARTED",
            RequestState::Succeeded => "SUCCEEDED",
            RequestState::Failed => "FAILED",
            RequestState::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single status poll.
///
/// `attributes` is only present for [`RequestState::Succeeded`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackchannelAuthenticationResult {
    /// Current state.
    pub state: RequestState,
    /// Resolved identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AuthenticationAttributes>,
}

impl BackchannelAuthenticationResult {
    /// Still pending.
    pub fn started() -> Self {
        Self {
            state: RequestState::Started,
            attributes: None,
        }
    }

    /// Resolved to `attributes`.
    pub fn succeeded(attributes: AuthenticationAttributes) -> Self {
        Self {
            state: RequestState::Succeeded,
            attributes: Some(attributes),
        }
    }

    /// Rejected.
    pub fn failed() -> Self {
        Self {
            state: RequestState::Failed,
            attributes: None,
        }
    }

    /// Unknown or forgotten.
    pub fn expired() -> Self {
        Self {
            state: RequestState::Expired,
            attributes: None,
        }
    }
}
