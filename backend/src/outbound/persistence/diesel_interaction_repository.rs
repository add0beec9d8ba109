//! PostgreSQL-backed `InteractionRepository`.
//!
//! Activity is aggregated in SQL (`GROUP BY itinerary, type`) and folded into
//! one [`InteractionActivity`] per itinerary here. Score replacement deletes
//! and re-inserts inside one transaction.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{InteractionRepository, InteractionRepositoryError};
use crate::domain::{
    Interaction, InteractionActivity, InteractionCounts, InteractionType, ItineraryId,
    TrendingScore,
};

use super::error_mapping::{is_foreign_key_violation, map_diesel_error, map_pool_error};
use super::models::{NewInteractionRow, NewTrendingScoreRow};
use super::pool::{DbPool, PoolError};
use super::schema::{itineraries, trending_scores, user_interactions};

/// Diesel implementation of the discovery store.
#[derive(Clone)]
pub struct DieselInteractionRepository {
    pool: DbPool,
}

impl DieselInteractionRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> InteractionRepositoryError {
    map_pool_error(error, InteractionRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> InteractionRepositoryError {
    if is_foreign_key_violation(&error) {
        return InteractionRepositoryError::unknown_itinerary();
    }
    map_diesel_error(
        error,
        InteractionRepositoryError::query,
        InteractionRepositoryError::connection,
    )
}

type ActivityRow = (Uuid, DateTime<Utc>, String, i64);

fn fold_activity(rows: Vec<ActivityRow>) -> Vec<InteractionActivity> {
    let mut by_itinerary: BTreeMap<Uuid, InteractionActivity> = BTreeMap::new();
    for (itinerary_id, created_at, kind, count) in rows {
        let Ok(kind) = kind.parse::<InteractionType>() else {
            warn!(%itinerary_id, interaction_type = %kind, "ignoring unknown interaction type");
            continue;
        };
        by_itinerary
            .entry(itinerary_id)
            .or_insert_with(|| InteractionActivity {
                itinerary_id: ItineraryId::from_uuid(itinerary_id),
                created_at,
                counts: InteractionCounts::default(),
            })
            .counts
            .add(kind, u64::try_from(count).unwrap_or_default());
    }
    by_itinerary.into_values().collect()
}

#[async_trait]
impl InteractionRepository for DieselInteractionRepository {
    async fn record(&self, interaction: &Interaction) -> Result<(), InteractionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(user_interactions::table)
            .values(&NewInteractionRow {
                id: Uuid::new_v4(),
                user_id: *interaction.user_id.as_uuid(),
                itinerary_id: *interaction.itinerary_id.as_uuid(),
                interaction_type: interaction.kind.as_str(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn activity_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<InteractionActivity>, InteractionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<ActivityRow> = user_interactions::table
            .inner_join(itineraries::table)
            .filter(user_interactions::created_at.ge(since))
            .group_by((
                user_interactions::itinerary_id,
                itineraries::created_at,
                user_interactions::interaction_type,
            ))
            .select((
                user_interactions::itinerary_id,
                itineraries::created_at,
                user_interactions::interaction_type,
                count_star(),
            ))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(fold_activity(rows))
    }

    async fn replace_scores(
        &self,
        scores: &[TrendingScore],
    ) -> Result<(), InteractionRepositoryError> {
        let rows: Vec<NewTrendingScoreRow> = scores
            .iter()
            .map(|score| NewTrendingScoreRow {
                itinerary_id: *score.itinerary_id.as_uuid(),
                score: score.score,
                computed_at: score.computed_at,
            })
            .collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::delete(trending_scores::table).execute(conn).await?;
                if !rows.is_empty() {
                    diesel::insert_into(trending_scores::table)
                        .values(&rows)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }
}
