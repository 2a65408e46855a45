//! The backchannel authentication state machine.
//!
//! ```text
//!  (none)            --start-->                          STARTED(unpolled)
//!  STARTED(unpolled) --poll-->                           STARTED(polled)
//!  STARTED(polled)   --poll, delay pending-->            STARTED(polled)
//!  STARTED(polled)   --poll, rejecting subject-->        FAILED
//!  STARTED(polled)   --poll-->                           SUCCEEDED
//!  any               --cancel / TTL-->                   (forgotten)
//!  unknown id        --poll-->                           EXPIRED
//! ```
//!
//! Terminal outcomes are recomputed on every poll from the immutable start
//! time and the configuration, so repeated polls of a resolved request keep
//! returning the same outcome until it is cancelled or expires.

use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info, trace};

use bca_storage::{RequestRecord, RequestRegistry, StateTracker};

use crate::{
    AuthenticationAttributes, BackchannelAuthenticationResult, BackchannelConfig,
    BackchannelError, Clock, SystemClock,
};

/// Tracks backchannel authentication requests and resolves polls.
///
/// Construct one per process and share it behind an `Arc`.
pub struct BackchannelAuthenticator {
    registry: RequestRegistry,
    tracker: StateTracker,
    config: BackchannelConfig,
    clock: Arc<dyn Clock>,
}

impl BackchannelAuthenticator {
    /// Creates an authenticator reading the system clock.
    pub fn new(config: BackchannelConfig) -> Result<Self, BackchannelError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an authenticator with an explicit clock.
    pub fn with_clock(
        config: BackchannelConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, BackchannelError> {
        config.validate()?;

        info!(
            delay_secs = ?config.delay_secs,
            rejecting_subject = ?config.rejecting_subject,
            request_ttl_secs = ?config.request_ttl_secs,
            "Backchannel authenticator initialized"
        );

        Ok(Self {
            registry: RequestRegistry::new(),
            tracker: StateTracker::new(),
            config,
            clock,
        })
    }

    /// The active policy.
    pub fn config(&self) -> &BackchannelConfig {
        &self.config
    }

    /// Registers a new request for `subject`.
    ///
    /// The request's status is established by the first [`check_status`](Self::check_status).
    ///
    /// # Errors
    ///
    /// - [`BackchannelError::InvalidRequest`] if `id` or `subject` is empty
    /// - [`BackchannelError::DuplicateRequest`] if `id` is already in flight
    pub async fn start(&self, id: &str, subject: &str) -> Result<(), BackchannelError> {
        trace!(auth_req_id = %id, "start() called");

        if id.is_empty() {
            return Err(BackchannelError::InvalidRequest(
                "auth_req_id cannot be empty".into(),
            ));
        }
        if subject.is_empty() {
            return Err(BackchannelError::InvalidRequest(
                "subject cannot be empty".into(),
            ));
        }

        let now = self.clock.now();
        self.registry.put(id, subject, now).await?;
        // A marker left behind by a poll that raced a cancel would skip the first STARTED.
        self.tracker.remove(id).await;

        debug!(auth_req_id = %id, subject = %subject, "Authentication started");
        Ok(())
    }

    /// Polls the state of request `id`.
    pub async fn check_status(&self, id: &str) -> BackchannelAuthenticationResult {
        trace!(auth_req_id = %id, "check_status() called");

        let Some(record) = self.registry.get(id).await else {
            trace!(auth_req_id = %id, "Unknown request");
            return BackchannelAuthenticationResult::expired();
        };

        let now = self.clock.now();

        if self.is_past_ttl(&record, now) {
            self.forget(id).await;
            debug!(auth_req_id = %id, "Request outlived its TTL");
            return BackchannelAuthenticationResult::expired();
        }

        if self.tracker.mark_started(id, now).await {
            // Cancelled or swept since the lookup
            if !self.registry.contains(id).await {
                self.tracker.remove(id).await;
                return BackchannelAuthenticationResult::expired();
            }
            trace!(auth_req_id = %id, "Authentication pending, first poll");
            return BackchannelAuthenticationResult::started();
        }

        if let Some(delay) = self.config.delay() {
            match record.started_at.checked_add(delay) {
                Some(deadline) if now < deadline => {
                    trace!(auth_req_id = %id, ?deadline, "Authentication pending until deadline");
                    return BackchannelAuthenticationResult::started();
                },
                Some(_) => {},
                None => return BackchannelAuthenticationResult::started(),
            }
        }

        if self.config.is_rejecting(&record.subject) {
            trace!(auth_req_id = %id, subject = %record.subject, "Subject is rejecting authentication");
            return BackchannelAuthenticationResult::failed();
        }

        trace!(auth_req_id = %id, "Authentication done");
        BackchannelAuthenticationResult::succeeded(AuthenticationAttributes::for_subject(
            record.subject,
        ))
    }

    /// Forgets request `id`. Unknown ids are ignored.
    pub async fn cancel(&self, id: &str) {
        trace!(auth_req_id = %id, "cancel() called");

        if self.forget(id).await {
            debug!(auth_req_id = %id, "Authentication cancelled");
        }
    }

    /// Removes every request whose TTL has run out.
    ///
    /// Returns the number of requests removed. Without a TTL nothing expires.
    pub async fn sweep_expired(&self) -> usize {
        let Some(ttl) = self.config.request_ttl() else {
            return 0;
        };
        let Some(cutoff) = self.clock.now().checked_sub(ttl) else {
            return 0;
        };

        let removed = self.registry.remove_started_at_or_before(cutoff).await;
        for id in &removed {
            self.tracker.remove(id).await;
        }

        if !removed.is_empty() {
            debug!(count = removed.len(), "Swept expired requests");
        }
        removed.len()
    }

    /// Number of requests currently registered.
    pub async fn pending_requests(&self) -> usize {
        self.registry.len().await
    }

    fn is_past_ttl(&self, record: &RequestRecord, now: SystemTime) -> bool {
        self.config
            .request_ttl()
            .and_then(|ttl| record.started_at.checked_add(ttl))
            .is_some_and(|expires_at| now >= expires_at)
    }

    /// Drops `id` from both stores. Returns `true` if it was registered.
    ///
    /// The registry goes first so a concurrent first poll either sees the
    /// id gone or has its marker removed here.
    async fn forget(&self, id: &str) -> bool {
        let registered = self.registry.remove(id).await.is_some();
        self.tracker.remove(id).await;
        registered
    }
}
