//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, senders, stores) describe what the domain
//! needs from infrastructure; driving ports (`*Command`, `*Query`,
//! `NotificationDispatch`, `NotificationSettings`) are what inbound adapters
//! call. Each driven port exposes a typed error enum built with
//! [`define_port_error!`] so adapters map failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod coin_ledger_command;
mod coin_ledger_repository;
mod discovery_command;
mod email_sender;
mod identity_provider;
mod interaction_repository;
mod itinerary_repository;
mod itinerary_view_command;
mod login_event_repository;
mod notification_dispatch;
mod notification_preferences_repository;
mod push_sender;
mod push_subscription_repository;
mod rate_limit_store;
mod user_directory;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::AccountCommand;
#[cfg(test)]
pub use coin_ledger_command::{MockCoinLedgerCommand, MockCoinLedgerQuery};
pub use coin_ledger_command::{CoinLedgerCommand, CoinLedgerQuery};
#[cfg(test)]
pub use coin_ledger_repository::MockCoinLedgerRepository;
pub use coin_ledger_repository::{CoinLedgerRepository, CoinLedgerRepositoryError};
#[cfg(test)]
pub use discovery_command::MockDiscoveryCommand;
pub use discovery_command::DiscoveryCommand;
#[cfg(test)]
pub use email_sender::MockEmailSender;
pub use email_sender::{EmailSender, EmailSenderError, FixtureEmailSender};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{FixtureIdentityProvider, IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use interaction_repository::MockInteractionRepository;
pub use interaction_repository::{
    FixtureInteractionRepository, InteractionRepository, InteractionRepositoryError,
};
#[cfg(test)]
pub use itinerary_repository::MockItineraryRepository;
pub use itinerary_repository::{ItineraryRepository, ItineraryRepositoryError, ItineraryViews};
#[cfg(test)]
pub use itinerary_view_command::MockItineraryViewCommand;
pub use itinerary_view_command::ItineraryViewCommand;
#[cfg(test)]
pub use login_event_repository::MockLoginEventRepository;
pub use login_event_repository::{
    FixtureLoginEventRepository, LoginEventRepository, LoginEventRepositoryError,
};
#[cfg(test)]
pub use notification_dispatch::{MockNotificationDispatch, MockNotificationSettings};
pub use notification_dispatch::{NotificationDispatch, NotificationSettings};
#[cfg(test)]
pub use notification_preferences_repository::MockNotificationPreferencesRepository;
pub use notification_preferences_repository::{
    FixtureNotificationPreferencesRepository, NotificationPreferencesRepository,
    NotificationPreferencesRepositoryError,
};
#[cfg(test)]
pub use push_sender::MockPushSender;
pub use push_sender::{FixturePushSender, PushSender, PushSenderError};
#[cfg(test)]
pub use push_subscription_repository::MockPushSubscriptionRepository;
pub use push_subscription_repository::{
    FixturePushSubscriptionRepository, PushSubscriptionRepository,
    PushSubscriptionRepositoryError,
};
#[cfg(test)]
pub use rate_limit_store::MockRateLimitStore;
pub use rate_limit_store::{
    FixtureRateLimitStore, RateLimitStore, RateLimitStoreError, WindowHit,
};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{FixtureUserDirectory, UserDirectory, UserDirectoryError};
