//! Discovery: interaction tracking and trending scores.
//!
//! Interactions are appended as they happen. A scheduled caller asks
//! [`DiscoveryService`] to recompute scores from recent activity; the formula
//! lives behind [`TrendingPolicy`] so it can be swapped without touching
//! storage or transport.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::ports::{DiscoveryCommand, InteractionRepository, InteractionRepositoryError};
use super::{Error, ItineraryId, UserId};

/// Interaction categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// Itinerary opened.
    View,
    /// Itinerary liked.
    Like,
    /// Comment posted.
    Comment,
    /// Itinerary saved to a list.
    Save,
    /// Itinerary shared.
    Share,
}

impl InteractionType {
    /// Stable storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Save => "save",
            Self::Share => "share",
        }
    }
}

impl FromStr for InteractionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "like" => Ok(Self::Like),
            "comment" => Ok(Self::Comment),
            "save" => Ok(Self::Save),
            "share" => Ok(Self::Share),
            other => Err(Error::invalid_request(format!(
                "unknown interaction type `{other}`"
            ))),
        }
    }
}

/// One interaction event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    /// Acting user.
    pub user_id: UserId,
    /// Target itinerary.
    pub itinerary_id: ItineraryId,
    /// Category.
    pub kind: InteractionType,
}

/// Interaction totals for one itinerary over the scoring window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionCounts {
    /// Views.
    pub views: u64,
    /// Likes.
    pub likes: u64,
    /// Comments.
    pub comments: u64,
    /// Saves.
    pub saves: u64,
    /// Shares.
    pub shares: u64,
}

impl InteractionCounts {
    /// Count one more interaction of `kind`.
    pub fn add(&mut self, kind: InteractionType, amount: u64) {
        let slot = match kind {
            InteractionType::View => &mut self.views,
            InteractionType::Like => &mut self.likes,
            InteractionType::Comment => &mut self.comments,
            InteractionType::Save => &mut self.saves,
            InteractionType::Share => &mut self.shares,
        };
        *slot = slot.saturating_add(amount);
    }
}

/// Scoring input for one itinerary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionActivity {
    /// Itinerary scored.
    pub itinerary_id: ItineraryId,
    /// When the itinerary was created; drives recency decay.
    pub created_at: DateTime<Utc>,
    /// Interaction totals within the window.
    pub counts: InteractionCounts,
}

/// Persisted trending score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendingScore {
    /// Itinerary scored.
    pub itinerary_id: ItineraryId,
    /// Higher ranks first.
    pub score: f64,
    /// Computation time.
    pub computed_at: DateTime<Utc>,
}

/// Summary of a refresh run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendingRefresh {
    /// Itineraries that received a score.
    pub scored: usize,
}

/// Replaceable scoring formula.
pub trait TrendingPolicy: Send + Sync {
    /// Score `activity` as of `now`.
    fn score(&self, activity: &InteractionActivity, now: DateTime<Utc>) -> f64;
}

/// Per-type weights applied before decay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionWeights {
    /// Weight of one view.
    pub view: f64,
    /// Weight of one like.
    pub like: f64,
    /// Weight of one comment.
    pub comment: f64,
    /// Weight of one save.
    pub save: f64,
    /// Weight of one share.
    pub share: f64,
}

impl Default for InteractionWeights {
    fn default() -> Self {
        Self {
            view: 1.0,
            like: 3.0,
            comment: 4.0,
            save: 5.0,
            share: 6.0,
        }
    }
}

impl InteractionWeights {
    fn weigh(&self, counts: &InteractionCounts) -> f64 {
        self.view * counts.views as f64
            + self.like * counts.likes as f64
            + self.comment * counts.comments as f64
            + self.save * counts.saves as f64
            + self.share * counts.shares as f64
    }
}

/// Gravity decay: `weighted / (age_hours + 2) ^ gravity`.
///
/// # Examples
/// ```
/// use chrono::{TimeDelta, Utc};
/// use itinera::domain::{
///     GravityTrendingPolicy, InteractionActivity, InteractionCounts, ItineraryId,
///     TrendingPolicy,
/// };
///
/// let now = Utc::now();
/// let activity = InteractionActivity {
///     itinerary_id: ItineraryId::from_uuid(uuid::Uuid::nil()),
///     created_at: now - TimeDelta::hours(2),
///     counts: InteractionCounts { likes: 8, ..Default::default() },
/// };
/// let score = GravityTrendingPolicy::default().score(&activity, now);
/// assert!((score - 24.0 / 8.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityTrendingPolicy {
    gravity: f64,
    weights: InteractionWeights,
}

impl GravityTrendingPolicy {
    /// Policy with a custom exponent and weights.
    pub fn new(gravity: f64, weights: InteractionWeights) -> Self {
        Self { gravity, weights }
    }
}

impl Default for GravityTrendingPolicy {
    fn default() -> Self {
        Self::new(1.5, InteractionWeights::default())
    }
}

impl TrendingPolicy for GravityTrendingPolicy {
    fn score(&self, activity: &InteractionActivity, now: DateTime<Utc>) -> f64 {
        let age_secs = (now - activity.created_at).num_seconds().max(0);
        let age_hours = age_secs as f64 / 3600.0;
        self.weights.weigh(&activity.counts) / (age_hours + 2.0).powf(self.gravity)
    }
}

/// Discovery service implementing [`DiscoveryCommand`].
#[derive(Clone)]
pub struct DiscoveryService<R> {
    interaction_repo: Arc<R>,
    policy: Arc<dyn TrendingPolicy>,
    clock: Arc<dyn Clock>,
    lookback: Duration,
}

impl<R> DiscoveryService<R> {
    /// Activity older than this does not contribute to trending.
    pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(7 * 24 * 3600);

    /// Create a service scoring with `policy`.
    pub fn new(
        interaction_repo: Arc<R>,
        policy: Arc<dyn TrendingPolicy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            interaction_repo,
            policy,
            clock,
            lookback: Self::DEFAULT_LOOKBACK,
        }
    }
}

impl<R> DiscoveryService<R>
where
    R: InteractionRepository,
{
    fn map_interaction_error(error: InteractionRepositoryError) -> Error {
        match error {
            InteractionRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("interaction store unavailable: {message}"))
            }
            InteractionRepositoryError::Query { message } => {
                Error::internal(format!("interaction store error: {message}"))
            }
            InteractionRepositoryError::UnknownItinerary => {
                Error::not_found("itinerary not found")
            }
        }
    }
}

#[async_trait]
impl<R> DiscoveryCommand for DiscoveryService<R>
where
    R: InteractionRepository,
{
    async fn track_interaction(&self, interaction: Interaction) -> Result<(), Error> {
        self.interaction_repo
            .record(&interaction)
            .await
            .map_err(Self::map_interaction_error)
    }

    async fn refresh_trending(&self) -> Result<TrendingRefresh, Error> {
        let now = self.clock.utc();
        let since = now - TimeDelta::from_std(self.lookback).unwrap_or(TimeDelta::days(7));
        let activity = self
            .interaction_repo
            .activity_since(since)
            .await
            .map_err(Self::map_interaction_error)?;

        let scores: Vec<TrendingScore> = activity
            .iter()
            .map(|item| TrendingScore {
                itinerary_id: item.itinerary_id,
                score: self.policy.score(item, now),
                computed_at: now,
            })
            .collect();

        self.interaction_repo
            .replace_scores(&scores)
            .await
            .map_err(Self::map_interaction_error)?;
        info!(scored = scores.len(), "trending scores refreshed");
        Ok(TrendingRefresh {
            scored: scores.len(),
        })
    }
}
