//! Port for interaction events and trending scores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Interaction, InteractionActivity, TrendingScore};

use super::define_port_error;

define_port_error! {
    /// Errors raised by interaction repository adapters.
    pub enum InteractionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "interaction repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "interaction repository query failed: {message}",
        /// The interaction references an itinerary that does not exist.
        UnknownItinerary => "interaction references an unknown itinerary",
    }
}

/// Storage contract for the discovery pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Append one interaction event.
    async fn record(&self, interaction: &Interaction) -> Result<(), InteractionRepositoryError>;

    /// Per-itinerary interaction counts for events newer than `since`.
    async fn activity_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<InteractionActivity>, InteractionRepositoryError>;

    /// Replace the persisted scores with `scores` in one transaction.
    async fn replace_scores(&self, scores: &[TrendingScore])
    -> Result<(), InteractionRepositoryError>;
}

/// Fixture repository: records nothing and reports no activity.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureInteractionRepository;

#[async_trait]
impl InteractionRepository for FixtureInteractionRepository {
    async fn record(&self, _interaction: &Interaction) -> Result<(), InteractionRepositoryError> {
        Ok(())
    }

    async fn activity_since(
        &self,
        _since: DateTime<Utc>,
    ) -> Result<Vec<InteractionActivity>, InteractionRepositoryError> {
        Ok(Vec::new())
    }

    async fn replace_scores(
        &self,
        _scores: &[TrendingScore],
    ) -> Result<(), InteractionRepositoryError> {
        Ok(())
    }
}
