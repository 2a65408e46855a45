//! # BCA Storage
//!
//! Process-lifetime stores backing backchannel authentication requests.
//!
//! - [`RequestRegistry`] maps a request id to its subject and start time.
//! - [`StateTracker`] remembers which requests have been polled at least once.
//!
//! Both stores are independently consistent. Neither holds a lock across the
//! other, so operations on distinct request ids never block each other for
//! longer than a single map access.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod registry;
pub mod tracker;

pub use error::StorageError;
pub use registry::{RequestRecord, RequestRegistry};
pub use tracker::{StateTracker, TrackedRequest};
