//! Driving port for discovery: interaction tracking and trending refresh.

use async_trait::async_trait;

use crate::domain::{Error, Interaction, TrendingRefresh};

/// Inbound contract for the discovery pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoveryCommand: Send + Sync {
    /// Record a typed interaction for later aggregation.
    async fn track_interaction(&self, interaction: Interaction) -> Result<(), Error>;

    /// Recompute and persist trending scores.
    async fn refresh_trending(&self) -> Result<TrendingRefresh, Error>;
}
