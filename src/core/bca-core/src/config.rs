//! Backchannel authentication policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::BackchannelError;

/// Policy applied when polling a request.
///
/// Constant for the lifetime of a [`BackchannelAuthenticator`](crate::BackchannelAuthenticator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackchannelConfig {
    /// Seconds between a request's creation and its earliest resolution.
    pub delay_secs: Option<u64>,

    /// Subject whose authentication is always denied.
    pub rejecting_subject: Option<String>,

    /// Name of the frontchannel authenticator this one is linked to.
    pub frontchannel_authenticator: Option<String>,

    /// Seconds after which an unresolved request is forgotten.
    pub request_ttl_secs: Option<u64>,
}

impl BackchannelConfig {
    /// Configured delay, if any.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_secs.map(Duration::from_secs)
    }

    /// Configured request TTL, if any.
    pub fn request_ttl(&self) -> Option<Duration> {
        self.request_ttl_secs.map(Duration::from_secs)
    }

    /// Whether `subject` is the configured rejecting subject.
    pub fn is_rejecting(&self, subject: &str) -> bool {
        self.rejecting_subject.as_deref() == Some(subject)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), BackchannelError> {
        if matches!(self.rejecting_subject.as_deref(), Some("")) {
            return Err(BackchannelError::Configuration(
                "rejecting_subject cannot be empty".into(),
            ));
        }

        if let Some(ttl) = self.request_ttl_secs {
            if ttl == 0 {
                return Err(BackchannelError::Configuration(
                    "request_ttl_secs must be > 0".into(),
                ));
            }
            if let Some(delay) = self.delay_secs {
                if ttl <= delay {
                    return Err(BackchannelError::Configuration(format!(
                        "request_ttl_secs ({ttl}) must be greater than delay_secs ({delay})"
                    )));
                }
            }
        }

        Ok(())
    }
}
