//! PostgreSQL-backed `LoginEventRepository`.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::LoginEvent;
use crate::domain::ports::{LoginEventRepository, LoginEventRepositoryError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::NewLoginEventRow;
use super::pool::DbPool;
use super::schema::login_events;

/// Diesel implementation of the sign-in audit log.
#[derive(Clone)]
pub struct DieselLoginEventRepository {
    pool: DbPool,
}

impl DieselLoginEventRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginEventRepository for DieselLoginEventRepository {
    async fn record(&self, event: &LoginEvent) -> Result<(), LoginEventRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, LoginEventRepositoryError::connection))?;

        diesel::insert_into(login_events::table)
            .values(&NewLoginEventRow {
                id: Uuid::new_v4(),
                user_id: *event.user_id.as_uuid(),
                ip_address: event.ip_address.map(|ip| ip.to_string()),
                user_agent: event.user_agent.as_deref(),
                created_at: event.created_at,
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                map_diesel_error(
                    err,
                    LoginEventRepositoryError::query,
                    LoginEventRepositoryError::connection,
                )
            })
    }
}
