//! Driving port for itinerary view tracking.

use async_trait::async_trait;

use crate::domain::{Error, ItineraryId, ViewRecorded};

/// Inbound contract for recording itinerary views.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItineraryViewCommand: Send + Sync {
    /// Count one view and grant any milestone it unlocks.
    ///
    /// Fails with `not_found` for unknown itineraries. Milestone award
    /// failures are logged and never fail the view.
    async fn record_view(&self, itinerary_id: &ItineraryId) -> Result<ViewRecorded, Error>;
}
