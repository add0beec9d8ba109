//! PostgreSQL-backed `ItineraryRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ItineraryRepository, ItineraryRepositoryError, ItineraryViews};
use crate::domain::{ItineraryId, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::itineraries;

/// Diesel implementation of the itinerary view counter.
#[derive(Clone)]
pub struct DieselItineraryRepository {
    pool: DbPool,
}

impl DieselItineraryRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItineraryRepository for DieselItineraryRepository {
    async fn record_view(
        &self,
        itinerary_id: &ItineraryId,
    ) -> Result<Option<ItineraryViews>, ItineraryRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ItineraryRepositoryError::connection))?;

        // One UPDATE ... RETURNING: the increment and the read are atomic.
        let row: Option<(Uuid, Uuid, i64)> =
            diesel::update(itineraries::table.find(itinerary_id.as_uuid()))
                .set(itineraries::view_count.eq(itineraries::view_count + 1))
                .returning((
                    itineraries::id,
                    itineraries::owner_id,
                    itineraries::view_count,
                ))
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(|err| {
                    map_diesel_error(
                        err,
                        ItineraryRepositoryError::query,
                        ItineraryRepositoryError::connection,
                    )
                })?;

        Ok(row.map(|(id, owner_id, view_count)| ItineraryViews {
            itinerary_id: ItineraryId::from_uuid(id),
            owner_id: UserId::from_uuid(owner_id),
            view_count: u64::try_from(view_count).unwrap_or_default(),
        }))
    }
}
