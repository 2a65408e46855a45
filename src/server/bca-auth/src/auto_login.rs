//! Auto-login frontchannel authenticator.
//!
//! Signs in whoever asks. The subject is the configured user name, or a fresh
//! random UUID when none is configured.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use bca_core::AuthenticationAttributes;

use crate::{AuthError, Authenticator};

/// Configuration for the auto-login authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontchannelConfig {
    /// User to sign in. A random UUID is used when unset.
    pub username: Option<String>,
}

impl FrontchannelConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), AuthError> {
        if matches!(self.username.as_deref(), Some("")) {
            return Err(AuthError::Configuration("username cannot be empty".into()));
        }
        Ok(())
    }
}

/// Authenticator that signs in without collecting anything from the user.
pub struct AutoLoginAuthenticator {
    username: Option<String>,
}

impl AutoLoginAuthenticator {
    /// Creates a new auto-login authenticator.
    pub fn new(config: FrontchannelConfig) -> Result<Self, AuthError> {
        config.validate()?;
        Ok(Self {
            username: config.username,
        })
    }
}

#[async_trait]
impl Authenticator for AutoLoginAuthenticator {
    async fn authenticate(&self) -> Result<AuthenticationAttributes, AuthError> {
        let subject = match &self.username {
            Some(username) => username.clone(),
            None => Uuid::new_v4().to_string(),
        };

        debug!(subject = %subject, "Auto-login authenticated user");
        Ok(AuthenticationAttributes::for_subject(subject))
    }

    fn name(&self) -> &'static str {
        "test"
    }
}
