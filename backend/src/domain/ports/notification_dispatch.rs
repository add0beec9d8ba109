//! Driving ports for notifications.
//!
//! [`NotificationDispatch`] delivers events; [`NotificationSettings`] manages
//! the recipient-side switches and push endpoints.

use async_trait::async_trait;

use crate::domain::{
    DispatchOutcome, Error, NewPushSubscription, NotificationEvent, NotificationPreferences,
    NotificationPreferencesPatch, PushSubscription, UserId,
};

/// Inbound contract for delivering one event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDispatch: Send + Sync {
    /// Route `event` to the recipient's enabled channels.
    ///
    /// Channel failures never surface as errors; lookups of preferences,
    /// contacts and subscriptions do.
    async fn notify(&self, event: NotificationEvent) -> Result<DispatchOutcome, Error>;
}

/// Inbound contract for notification settings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSettings: Send + Sync {
    /// Stored flags merged over defaults.
    async fn preferences(&self, user_id: &UserId) -> Result<NotificationPreferences, Error>;

    /// Merge `patch` into the stored flags and return the effective result.
    async fn update_preferences(
        &self,
        user_id: &UserId,
        patch: NotificationPreferencesPatch,
    ) -> Result<NotificationPreferences, Error>;

    /// Register a push endpoint.
    async fn register_push(
        &self,
        subscription: NewPushSubscription,
    ) -> Result<PushSubscription, Error>;
}
