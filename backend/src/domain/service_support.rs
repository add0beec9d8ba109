//! Port error mapping and lookups shared by the domain services.

use super::ports::{
    NotificationPreferencesRepository, NotificationPreferencesRepositoryError,
    PushSubscriptionRepositoryError, UserDirectoryError,
};
use super::{Error, NotificationPreferences, UserId};

/// Stored flags for `user_id` merged over the defaults.
pub(crate) async fn effective_preferences(
    repo: &dyn NotificationPreferencesRepository,
    user_id: &UserId,
) -> Result<NotificationPreferences, Error> {
    let stored = repo
        .find(user_id)
        .await
        .map_err(map_preferences_error)?;
    Ok(stored.map_or_else(NotificationPreferences::default, |patch| {
        NotificationPreferences::default().merge(&patch)
    }))
}

pub(crate) fn map_preferences_error(error: NotificationPreferencesRepositoryError) -> Error {
    match error {
        NotificationPreferencesRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("preferences unavailable: {message}"))
        }
        NotificationPreferencesRepositoryError::Query { message } => {
            Error::internal(format!("preferences error: {message}"))
        }
    }
}

pub(crate) fn map_subscription_error(error: PushSubscriptionRepositoryError) -> Error {
    match error {
        PushSubscriptionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("push subscriptions unavailable: {message}"))
        }
        PushSubscriptionRepositoryError::Query { message } => {
            Error::internal(format!("push subscription error: {message}"))
        }
    }
}

pub(crate) fn map_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}
