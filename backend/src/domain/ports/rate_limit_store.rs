//! Port for the fixed-window counter store behind the rate limiter.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::RateLimitKey;

use super::define_port_error;

define_port_error! {
    /// Errors raised by rate-limit store adapters.
    pub enum RateLimitStoreError {
        /// The backing store could not be reached.
        Unavailable { message: String } =>
            "rate-limit store unavailable: {message}",
        /// The store rejected or failed the counting command.
        Command { message: String } =>
            "rate-limit store command failed: {message}",
    }
}

/// Counter state observed immediately after recording a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    /// Hits recorded in the current window, including this one.
    pub count: u32,
    /// Time left until the window expires.
    pub ttl: Duration,
}

/// Atomic increment-and-read against a shared counter.
///
/// Implementations must record the hit and read the resulting count in a
/// single atomic step. The window starts on the first hit for a key and the
/// counter disappears once `window` has elapsed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record one hit for `key` and report the window state.
    async fn hit(&self, key: &RateLimitKey, window: Duration)
    -> Result<WindowHit, RateLimitStoreError>;
}

/// Store that never counts; every hit looks like the first in a fresh window.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRateLimitStore;

#[async_trait]
impl RateLimitStore for FixtureRateLimitStore {
    async fn hit(
        &self,
        _key: &RateLimitKey,
        window: Duration,
    ) -> Result<WindowHit, RateLimitStoreError> {
        Ok(WindowHit {
            count: 1,
            ttl: window,
        })
    }
}
