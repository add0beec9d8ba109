//! PostgreSQL-backed `NotificationPreferencesRepository`.
//!
//! Flags are stored as one JSON object per user so new categories need no
//! migration; absent keys fall back to the domain defaults on read.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{
    NotificationPreferencesRepository, NotificationPreferencesRepositoryError,
};
use crate::domain::{NotificationPreferencesPatch, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewNotificationPreferencesRow, NotificationPreferencesRow};
use super::pool::{DbPool, PoolError};
use super::schema::notification_preferences;

/// Diesel implementation of stored notification flags.
#[derive(Clone)]
pub struct DieselNotificationPreferencesRepository {
    pool: DbPool,
}

impl DieselNotificationPreferencesRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> NotificationPreferencesRepositoryError {
    map_pool_error(error, NotificationPreferencesRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> NotificationPreferencesRepositoryError {
    map_diesel_error(
        error,
        NotificationPreferencesRepositoryError::query,
        NotificationPreferencesRepositoryError::connection,
    )
}

fn decode(
    user_id: &UserId,
    document: serde_json::Value,
) -> Result<NotificationPreferencesPatch, NotificationPreferencesRepositoryError> {
    serde_json::from_value(document).map_err(|err| {
        warn!(%user_id, error = %err, "stored notification preferences are malformed");
        NotificationPreferencesRepositoryError::query("malformed notification preferences")
    })
}

#[async_trait]
impl NotificationPreferencesRepository for DieselNotificationPreferencesRepository {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<NotificationPreferencesPatch>, NotificationPreferencesRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<NotificationPreferencesRow> = notification_preferences::table
            .find(user_id.as_uuid())
            .select(NotificationPreferencesRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(|row| decode(user_id, row.preferences)).transpose()
    }

    async fn save(
        &self,
        user_id: &UserId,
        preferences: &NotificationPreferencesPatch,
    ) -> Result<(), NotificationPreferencesRepositoryError> {
        let document = serde_json::to_value(preferences)
            .map_err(|err| NotificationPreferencesRepositoryError::query(err.to_string()))?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::insert_into(notification_preferences::table)
            .values(&NewNotificationPreferencesRow {
                user_id: *user_id.as_uuid(),
                preferences: &document,
            })
            .on_conflict(notification_preferences::user_id)
            .do_update()
            .set((
                notification_preferences::preferences
                    .eq(excluded(notification_preferences::preferences)),
                notification_preferences::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }
}
