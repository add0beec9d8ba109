//! Port for web push subscriptions.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewPushSubscription, PushSubscription, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by push subscription adapters.
    pub enum PushSubscriptionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "push subscription connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "push subscription query failed: {message}",
    }
}

/// Storage contract for push endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSubscriptionRepository: Send + Sync {
    /// All endpoints registered by `user_id`.
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PushSubscription>, PushSubscriptionRepositoryError>;

    /// Register an endpoint; re-registering the same endpoint refreshes its
    /// keys and owner instead of duplicating it.
    async fn upsert(
        &self,
        subscription: &NewPushSubscription,
    ) -> Result<PushSubscription, PushSubscriptionRepositoryError>;

    /// Remove a subscription. Removing an absent row is not an error.
    async fn delete(&self, id: &Uuid) -> Result<(), PushSubscriptionRepositoryError>;
}

/// Fixture repository with no subscriptions.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePushSubscriptionRepository;

#[async_trait]
impl PushSubscriptionRepository for FixturePushSubscriptionRepository {
    async fn list_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<PushSubscription>, PushSubscriptionRepositoryError> {
        Ok(Vec::new())
    }

    async fn upsert(
        &self,
        subscription: &NewPushSubscription,
    ) -> Result<PushSubscription, PushSubscriptionRepositoryError> {
        Ok(subscription
            .clone()
            .into_subscription(Uuid::new_v4(), chrono::Utc::now()))
    }

    async fn delete(&self, _id: &Uuid) -> Result<(), PushSubscriptionRepositoryError> {
        Ok(())
    }
}
