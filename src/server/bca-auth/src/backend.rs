//! Frontchannel authenticator trait.

use async_trait::async_trait;

use bca_core::AuthenticationAttributes;

use crate::AuthError;

/// Trait for frontchannel authenticators.
///
/// Implementations produce the identity of the user signing in on the
/// frontchannel, which a linked backchannel authenticator may rely on.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticates the current user.
    ///
    /// # Returns
    ///
    /// * `Ok(AuthenticationAttributes)` - The authenticated identity
    /// * `Err(AuthError)` - If authentication fails
    async fn authenticate(&self) -> Result<AuthenticationAttributes, AuthError>;

    /// Returns the name of this authenticator for logging/debugging.
    fn name(&self) -> &'static str;
}
