//! # BCA Core
//!
//! Lifecycle of backchannel ("CIBA"-style) authentication requests.
//!
//! A caller starts a request on behalf of a subject and then polls it until
//! it resolves. Every request answers `STARTED` on its first poll. Later polls
//! stay `STARTED` until the configured delay has elapsed, then resolve to
//! `FAILED` for the configured rejecting subject and `SUCCEEDED` for anyone
//! else. Unknown, cancelled and timed-out requests answer `EXPIRED`.
//!
//! ## Components
//!
//! - [`BackchannelAuthenticator`] - the state machine, owning both stores
//! - [`BackchannelAuthenticationHandler`] - async seam consumed by transports
//! - [`BackchannelConfig`] - delay, rejection and TTL policy
//! - [`Clock`] - time source, swappable for deterministic tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authenticator;
pub mod clock;
pub mod config;
pub mod error;
pub mod handler;
pub mod identity;
pub mod state;

pub use authenticator::BackchannelAuthenticator;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::BackchannelConfig;
pub use error::BackchannelError;
pub use handler::BackchannelAuthenticationHandler;
pub use identity::{Attributes, AuthenticationAttributes, ContextAttributes, SubjectAttributes};
pub use state::{BackchannelAuthenticationResult, RequestState};
