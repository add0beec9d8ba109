//! Port for stored notification preferences.
//!
//! Stored flags are partial: anything the user never touched is absent and
//! resolves to the default when merged by the domain.

use async_trait::async_trait;

use crate::domain::{NotificationPreferencesPatch, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification preference adapters.
    pub enum NotificationPreferencesRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification preferences connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification preferences query failed: {message}",
    }
}

/// Storage contract for per-user notification flags.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPreferencesRepository: Send + Sync {
    /// Stored flags for `user_id`, or `None` when nothing was saved.
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<NotificationPreferencesPatch>, NotificationPreferencesRepositoryError>;

    /// Replace the stored flags for `user_id`.
    async fn save(
        &self,
        user_id: &UserId,
        preferences: &NotificationPreferencesPatch,
    ) -> Result<(), NotificationPreferencesRepositoryError>;
}

/// Fixture repository: nothing stored, saves discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationPreferencesRepository;

#[async_trait]
impl NotificationPreferencesRepository for FixtureNotificationPreferencesRepository {
    async fn find(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<NotificationPreferencesPatch>, NotificationPreferencesRepositoryError> {
        Ok(None)
    }

    async fn save(
        &self,
        _user_id: &UserId,
        _preferences: &NotificationPreferencesPatch,
    ) -> Result<(), NotificationPreferencesRepositoryError> {
        Ok(())
    }
}
