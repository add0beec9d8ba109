//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories are thin translators between Diesel rows and domain types.
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//! private to this module. Connections come from a `bb8` pool driven by
//! `diesel-async`; every failure is mapped into the port's own error enum.
//!
//! # Example
//!
//! ```no_run
//! use itinera::outbound::persistence::{DbPool, DieselCoinLedgerRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/itinera")).await?;
//! pool.run_migrations().await?;
//! let ledger = DieselCoinLedgerRepository::new(pool);
//! # let _ = ledger;
//! # Ok(())
//! # }
//! ```

mod diesel_coin_ledger_repository;
mod diesel_interaction_repository;
mod diesel_itinerary_repository;
mod diesel_login_event_repository;
mod diesel_notification_preferences_repository;
mod diesel_push_subscription_repository;
mod diesel_user_directory;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_coin_ledger_repository::DieselCoinLedgerRepository;
pub use diesel_interaction_repository::DieselInteractionRepository;
pub use diesel_itinerary_repository::DieselItineraryRepository;
pub use diesel_login_event_repository::DieselLoginEventRepository;
pub use diesel_notification_preferences_repository::DieselNotificationPreferencesRepository;
pub use diesel_push_subscription_repository::DieselPushSubscriptionRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use pool::{DbPool, PoolConfig, PoolError};
