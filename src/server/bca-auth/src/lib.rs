//! # BCA Auth
//!
//! Frontchannel authenticators paired with the backchannel test authenticator.
//!
//! ## Supported Methods
//!
//! - Auto-login: signs in a fixed or random user without asking for anything
//! - Auth-done token inspection: echoes the claims of a posted JWT
//!
//! Neither method verifies credentials. They exist to drive test flows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth_done;
pub mod auto_login;
pub mod backend;
pub mod error;

pub use auth_done::{inspect_auth_token, AuthDoneOutcome};
pub use auto_login::{AutoLoginAuthenticator, FrontchannelConfig};
pub use backend::Authenticator;
pub use error::AuthError;
