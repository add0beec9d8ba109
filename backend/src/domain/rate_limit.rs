//! Fixed-window rate limiting.
//!
//! A [`RateLimiter`] records one hit per call against a shared
//! [`RateLimitStore`] and compares the resulting count with the policy
//! budget. The store performs the increment atomically, so concurrent callers
//! at the boundary can never push more than `max_requests` through a window.
//!
//! Each [`RateLimitPolicy`] declares how to behave when the store is
//! unreachable: security-sensitive policies fail closed, analytics policies
//! fail open.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::warn;

use super::Error;
use super::ports::{RateLimitStore, WindowHit};

/// Behaviour when the counter store cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Let the request through.
    Open,
    /// Reject the request as temporarily unavailable.
    Closed,
}

/// Request budget for one purpose.
///
/// # Examples
/// ```
/// use itinera::domain::{FailureMode, RateLimitPolicy};
///
/// let policy = RateLimitPolicy::PASSWORD_RESET;
/// assert_eq!(policy.max_requests(), 3);
/// assert_eq!(policy.window().as_secs(), 900);
/// assert_eq!(policy.failure_mode(), FailureMode::Closed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    purpose: &'static str,
    max_requests: u32,
    window: Duration,
    failure_mode: FailureMode,
}

impl RateLimitPolicy {
    /// Password reset requests per client address.
    pub const PASSWORD_RESET: Self = Self::new("reset", 3, 900, FailureMode::Closed);
    /// Sign-in attempts per client address.
    pub const SIGN_IN: Self = Self::new("signin", 10, 900, FailureMode::Closed);
    /// Welcome emails per user.
    pub const WELCOME_EMAIL: Self = Self::new("welcome", 3, 3600, FailureMode::Closed);
    /// Coin spending and other creator-facing mutations per user.
    pub const CREATOR_API: Self = Self::new("creator", 30, 60, FailureMode::Closed);
    /// View and interaction tracking per client address.
    pub const VIEW_TRACKING: Self = Self::new("view", 60, 60, FailureMode::Open);
    /// Notification emails triggered per acting user.
    pub const NOTIFICATION_EMAIL: Self = Self::new("notify", 30, 60, FailureMode::Closed);

    /// Build a policy allowing `max_requests` per `window_secs`.
    #[must_use]
    pub const fn new(
        purpose: &'static str,
        max_requests: u32,
        window_secs: u64,
        failure_mode: FailureMode,
    ) -> Self {
        Self {
            purpose,
            max_requests,
            window: Duration::from_secs(window_secs),
            failure_mode,
        }
    }

    /// Prefix used for keys counted under this policy.
    #[must_use]
    pub const fn purpose(&self) -> &'static str {
        self.purpose
    }

    /// Requests allowed per window.
    #[must_use]
    pub const fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Behaviour when the store is unavailable.
    #[must_use]
    pub const fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    /// Key counting `subject` (a client address or user id) under this policy.
    #[must_use]
    pub fn key_for(&self, subject: impl fmt::Display) -> RateLimitKey {
        RateLimitKey(format!("{}:{subject}", self.purpose))
    }
}

/// Counter key in the form `<purpose>:<subject>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey(String);

impl RateLimitKey {
    /// Borrow the key text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request fits within the budget.
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Instant at which the window resets.
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    fn from_hit(policy: &RateLimitPolicy, hit: WindowHit, now: DateTime<Utc>) -> Self {
        Self {
            allowed: hit.count <= policy.max_requests(),
            remaining: policy.max_requests().saturating_sub(hit.count),
            reset_at: now + to_delta(hit.ttl),
        }
    }

    fn bypassed(policy: &RateLimitPolicy, now: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            remaining: policy.max_requests(),
            reset_at: now + to_delta(policy.window()),
        }
    }

    /// Whole seconds until `reset_at`, rounded up and never below one.
    #[must_use]
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0);
        let secs = u64::try_from(millis).unwrap_or(0).div_ceil(1000);
        secs.max(1)
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// Applies [`RateLimitPolicy`] budgets against a [`RateLimitStore`].
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter over `store`.
    pub fn new(store: Arc<dyn RateLimitStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Record a hit for `key` and report whether it fits the budget.
    ///
    /// Store failures follow the policy's [`FailureMode`]: fail-open yields an
    /// allowed decision, fail-closed yields a service-unavailable error.
    pub async fn check(
        &self,
        key: &RateLimitKey,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, Error> {
        let now = self.clock.utc();
        match self.store.hit(key, policy.window()).await {
            Ok(hit) => Ok(RateLimitDecision::from_hit(policy, hit, now)),
            Err(error) => {
                warn!(
                    purpose = policy.purpose(),
                    failure_mode = ?policy.failure_mode(),
                    %error,
                    "rate-limit store failed"
                );
                match policy.failure_mode() {
                    FailureMode::Open => Ok(RateLimitDecision::bypassed(policy, now)),
                    FailureMode::Closed => Err(Error::service_unavailable(
                        "request throttling is temporarily unavailable",
                    )),
                }
            }
        }
    }

    /// Like [`Self::check`] but converts a denial into a `too_many_requests`
    /// error carrying the retry hint.
    pub async fn enforce(
        &self,
        key: &RateLimitKey,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, Error> {
        let decision = self.check(key, policy).await?;
        if decision.allowed {
            return Ok(decision);
        }
        let retry_after = decision.retry_after_secs(self.clock.utc());
        Err(
            Error::too_many_requests("too many requests, try again later", retry_after)
                .with_details(json!({ "resetAt": decision.reset_at.to_rfc3339() })),
        )
    }
}
