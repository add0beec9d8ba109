//! In-process adapters for the ledger and view counters.
//!
//! The server falls back to these when no database is configured; the
//! integration tests drive the domain services through them.

mod coin_ledger;
mod itinerary_repository;

pub use coin_ledger::InMemoryCoinLedger;
pub use itinerary_repository::InMemoryItineraryRepository;
