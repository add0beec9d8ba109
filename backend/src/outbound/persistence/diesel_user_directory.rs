//! PostgreSQL-backed `UserDirectory`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{EmailAddress, UserContact, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::UserContactRow;
use super::pool::DbPool;
use super::schema::users;

/// Diesel implementation of contact lookups.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    /// Create a directory over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_contact(row: UserContactRow) -> UserContact {
    let email = row.email.and_then(|raw| match EmailAddress::new(raw) {
        Ok(email) => Some(email),
        Err(_) => {
            warn!(user_id = %row.id, "stored email address is invalid; treating as absent");
            None
        }
    });
    UserContact {
        user_id: UserId::from_uuid(row.id),
        display_name: row.display_name,
        email,
    }
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn find_contact(&self, user_id: &UserId) -> Result<Option<UserContact>, UserDirectoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserDirectoryError::connection))?;

        let row: Option<UserContactRow> = users::table
            .find(user_id.as_uuid())
            .select(UserContactRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_diesel_error(err, UserDirectoryError::query, UserDirectoryError::connection)
            })?;

        Ok(row.map(row_to_contact))
    }
}
