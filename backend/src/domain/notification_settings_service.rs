//! Notification settings: preference flags and push endpoint registration.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::service_support::{
    effective_preferences, map_preferences_error, map_subscription_error,
};
use super::ports::{
    NotificationPreferencesRepository, NotificationSettings, PushSubscriptionRepository,
};
use super::{
    Error, NewPushSubscription, NotificationPreferences, NotificationPreferencesPatch,
    PushSubscription, UserId,
};

/// Settings service implementing [`NotificationSettings`].
#[derive(Clone)]
pub struct NotificationSettingsService<P, S> {
    preferences_repo: Arc<P>,
    subscription_repo: Arc<S>,
}

impl<P, S> NotificationSettingsService<P, S> {
    /// Create a new service with the given repositories.
    pub fn new(preferences_repo: Arc<P>, subscription_repo: Arc<S>) -> Self {
        Self {
            preferences_repo,
            subscription_repo,
        }
    }
}

#[async_trait]
impl<P, S> NotificationSettings for NotificationSettingsService<P, S>
where
    P: NotificationPreferencesRepository + 'static,
    S: PushSubscriptionRepository + 'static,
{
    async fn preferences(&self, user_id: &UserId) -> Result<NotificationPreferences, Error> {
        effective_preferences(self.preferences_repo.as_ref(), user_id).await
    }

    async fn update_preferences(
        &self,
        user_id: &UserId,
        patch: NotificationPreferencesPatch,
    ) -> Result<NotificationPreferences, Error> {
        let merged = effective_preferences(self.preferences_repo.as_ref(), user_id)
            .await?
            .merge(&patch);
        self.preferences_repo
            .save(user_id, &NotificationPreferencesPatch::from(merged))
            .await
            .map_err(map_preferences_error)?;
        Ok(merged)
    }

    async fn register_push(
        &self,
        subscription: NewPushSubscription,
    ) -> Result<PushSubscription, Error> {
        let stored = self
            .subscription_repo
            .upsert(&subscription)
            .await
            .map_err(map_subscription_error)?;
        info!(user_id = %stored.user_id, subscription_id = %stored.id, "push endpoint registered");
        Ok(stored)
    }
}
