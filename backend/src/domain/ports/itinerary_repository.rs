//! Port for itinerary view counters.

use async_trait::async_trait;

use crate::domain::{ItineraryId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by itinerary repository adapters.
    pub enum ItineraryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "itinerary repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "itinerary repository query failed: {message}",
    }
}

/// View counter state after an increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryViews {
    /// Itinerary that was viewed.
    pub itinerary_id: ItineraryId,
    /// Owner credited with milestone awards.
    pub owner_id: UserId,
    /// Cumulative views including this one.
    pub view_count: u64,
}

/// Storage contract for itinerary view counts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItineraryRepository: Send + Sync {
    /// Atomically add one view and return the new count.
    ///
    /// Returns `None` when the itinerary does not exist.
    async fn record_view(
        &self,
        itinerary_id: &ItineraryId,
    ) -> Result<Option<ItineraryViews>, ItineraryRepositoryError>;
}
