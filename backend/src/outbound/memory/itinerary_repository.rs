//! In-process itinerary view counters.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{ItineraryRepository, ItineraryRepositoryError, ItineraryViews};
use crate::domain::{ItineraryId, UserId};

struct Counter {
    owner_id: UserId,
    view_count: u64,
}

/// Mutex-guarded view counters keyed by itinerary.
#[derive(Default)]
pub struct InMemoryItineraryRepository {
    itineraries: Mutex<HashMap<ItineraryId, Counter>>,
}

impl InMemoryItineraryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an itinerary owned by `owner_id` with `view_count` views.
    pub fn insert(&self, itinerary_id: ItineraryId, owner_id: UserId, view_count: u64) {
        self.itineraries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                itinerary_id,
                Counter {
                    owner_id,
                    view_count,
                },
            );
    }
}

#[async_trait]
impl ItineraryRepository for InMemoryItineraryRepository {
    async fn record_view(
        &self,
        itinerary_id: &ItineraryId,
    ) -> Result<Option<ItineraryViews>, ItineraryRepositoryError> {
        let mut itineraries = self
            .itineraries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(itineraries.get_mut(itinerary_id).map(|counter| {
            counter.view_count = counter.view_count.saturating_add(1);
            ItineraryViews {
                itinerary_id: *itinerary_id,
                owner_id: counter.owner_id.clone(),
                view_count: counter.view_count,
            }
        }))
    }
}
