//! Backchannel authentication handler trait.

use async_trait::async_trait;

use crate::{BackchannelAuthenticationResult, BackchannelAuthenticator, BackchannelError};

/// Operations a transport exposes for backchannel authentication.
///
/// Implementations track requests by caller-supplied id and answer status
/// polls until each request resolves.
#[async_trait]
pub trait BackchannelAuthenticationHandler: Send + Sync {
    /// Starts authenticating `subject` under `auth_req_id`.
    async fn start_authentication(
        &self,
        auth_req_id: &str,
        subject: &str,
    ) -> Result<(), BackchannelError>;

    /// Returns the current state of `auth_req_id`.
    async fn check_authentication_status(&self, auth_req_id: &str)
        -> BackchannelAuthenticationResult;

    /// Abandons `auth_req_id`. Always succeeds.
    async fn cancel_authentication_request(&self, auth_req_id: &str);

    /// Number of requests currently tracked.
    async fn pending_requests(&self) -> usize;

    /// Returns the name of this handler for logging/debugging.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl BackchannelAuthenticationHandler for BackchannelAuthenticator {
    async fn start_authentication(
        &self,
        auth_req_id: &str,
        subject: &str,
    ) -> Result<(), BackchannelError> {
        self.start(auth_req_id, subject).await
    }

    async fn check_authentication_status(
        &self,
        auth_req_id: &str,
    ) -> BackchannelAuthenticationResult {
        self.check_status(auth_req_id).await
    }

    async fn cancel_authentication_request(&self, auth_req_id: &str) {
        self.cancel(auth_req_id).await;
    }

    async fn pending_requests(&self) -> usize {
        BackchannelAuthenticator::pending_requests(self).await
    }

    fn name(&self) -> &'static str {
        "bca_test"
    }
}
