//! PostgreSQL-backed `PushSubscriptionRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::domain::ports::{PushSubscriptionRepository, PushSubscriptionRepositoryError};
use crate::domain::{NewPushSubscription, PushSubscription, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewPushSubscriptionRow, PushSubscriptionRow};
use super::pool::{DbPool, PoolError};
use super::schema::push_subscriptions;

/// Diesel implementation of push endpoint storage.
///
/// Endpoints are unique: registering a known endpoint again rebinds it to the
/// caller and refreshes its keys.
#[derive(Clone)]
pub struct DieselPushSubscriptionRepository {
    pool: DbPool,
}

impl DieselPushSubscriptionRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> PushSubscriptionRepositoryError {
    map_pool_error(error, PushSubscriptionRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> PushSubscriptionRepositoryError {
    map_diesel_error(
        error,
        PushSubscriptionRepositoryError::query,
        PushSubscriptionRepositoryError::connection,
    )
}

fn row_to_subscription(row: PushSubscriptionRow) -> Option<PushSubscription> {
    let endpoint = match Url::parse(&row.endpoint) {
        Ok(endpoint) => endpoint,
        Err(err) => {
            warn!(subscription_id = %row.id, error = %err, "skipping unparsable push endpoint");
            return None;
        }
    };
    Some(PushSubscription {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        endpoint,
        p256dh: row.p256dh,
        auth: row.auth,
        created_at: row.created_at,
    })
}

#[async_trait]
impl PushSubscriptionRepository for DieselPushSubscriptionRepository {
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PushSubscription>, PushSubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<PushSubscriptionRow> = push_subscriptions::table
            .filter(push_subscriptions::user_id.eq(user_id.as_uuid()))
            .select(PushSubscriptionRow::as_select())
            .order_by(push_subscriptions::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(rows.into_iter().filter_map(row_to_subscription).collect())
    }

    async fn upsert(
        &self,
        subscription: &NewPushSubscription,
    ) -> Result<PushSubscription, PushSubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: PushSubscriptionRow = diesel::insert_into(push_subscriptions::table)
            .values(&NewPushSubscriptionRow {
                id: Uuid::new_v4(),
                user_id: *subscription.user_id().as_uuid(),
                endpoint: subscription.endpoint().as_str(),
                p256dh: subscription.p256dh(),
                auth: subscription.auth(),
            })
            .on_conflict(push_subscriptions::endpoint)
            .do_update()
            .set((
                push_subscriptions::user_id.eq(excluded(push_subscriptions::user_id)),
                push_subscriptions::p256dh.eq(excluded(push_subscriptions::p256dh)),
                push_subscriptions::auth.eq(excluded(push_subscriptions::auth)),
            ))
            .returning(PushSubscriptionRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(subscription
            .clone()
            .into_subscription(row.id, row.created_at))
    }

    async fn delete(&self, id: &Uuid) -> Result<(), PushSubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::delete(push_subscriptions::table.find(id))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }
}
