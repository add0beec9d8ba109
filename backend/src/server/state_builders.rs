//! Builders assembling domain services and the HTTP state from configuration.
//!
//! With a database pool the Diesel repositories back every service. Without
//! one the ledger and view counters live in process memory and the remaining
//! repositories are fixtures, which keeps local runs dependency-free.

use std::sync::Arc;

use mockable::Clock;

use itinera::domain::ports::{
    CoinLedgerCommand, CoinLedgerQuery, DiscoveryCommand, EmailSender, FixtureEmailSender,
    FixtureIdentityProvider, FixtureInteractionRepository, FixtureLoginEventRepository,
    FixtureNotificationPreferencesRepository, FixturePushSender,
    FixturePushSubscriptionRepository, FixtureUserDirectory, IdentityProvider,
    ItineraryViewCommand, LoginEventRepository, NotificationDispatch,
    NotificationPreferencesRepository, NotificationSettings, PushSender,
    PushSubscriptionRepository, RateLimitStore, UserDirectory,
};
use itinera::domain::{
    AccountPorts, AccountService, CoinLedgerService, DiscoveryService, GravityTrendingPolicy,
    ItineraryViewService, NotificationDispatcher, NotificationPorts,
    NotificationSettingsService, RateLimiter,
};
use itinera::inbound::http::state::{HttpState, HttpStatePorts};
use itinera::outbound::memory::{InMemoryCoinLedger, InMemoryItineraryRepository};
use itinera::outbound::persistence::{
    DbPool, DieselCoinLedgerRepository, DieselInteractionRepository, DieselItineraryRepository,
    DieselLoginEventRepository, DieselNotificationPreferencesRepository,
    DieselPushSubscriptionRepository, DieselUserDirectory,
};
use itinera::outbound::rate_limit::InMemoryRateLimitStore;

use super::ServerConfig;

type LedgerPair = (Arc<dyn CoinLedgerCommand>, Arc<dyn CoinLedgerQuery>);

/// Cast one service into its command and query halves.
fn split_ledger<S>(service: Arc<S>) -> LedgerPair
where
    S: CoinLedgerCommand + CoinLedgerQuery + 'static,
{
    (service.clone(), service)
}

fn build_ledger(pool: Option<&DbPool>, clock: &Arc<dyn Clock>) -> LedgerPair {
    match pool {
        Some(pool) => split_ledger(Arc::new(CoinLedgerService::new(Arc::new(
            DieselCoinLedgerRepository::new(pool.clone()),
        )))),
        None => split_ledger(Arc::new(CoinLedgerService::new(Arc::new(
            InMemoryCoinLedger::new(clock.clone()),
        )))),
    }
}

fn build_itinerary_views(
    pool: Option<&DbPool>,
    ledger: Arc<dyn CoinLedgerCommand>,
) -> Arc<dyn ItineraryViewCommand> {
    match pool {
        Some(pool) => Arc::new(ItineraryViewService::new(
            Arc::new(DieselItineraryRepository::new(pool.clone())),
            ledger,
        )),
        None => Arc::new(ItineraryViewService::new(
            Arc::new(InMemoryItineraryRepository::new()),
            ledger,
        )),
    }
}

fn build_discovery(
    pool: Option<&DbPool>,
    clock: &Arc<dyn Clock>,
) -> Arc<dyn DiscoveryCommand> {
    let policy = Arc::new(GravityTrendingPolicy::default());
    match pool {
        Some(pool) => Arc::new(DiscoveryService::new(
            Arc::new(DieselInteractionRepository::new(pool.clone())),
            policy,
            clock.clone(),
        )),
        None => Arc::new(DiscoveryService::new(
            Arc::new(FixtureInteractionRepository),
            policy,
            clock.clone(),
        )),
    }
}

/// Recipient-side notification storage and the settings service over it.
struct NotificationStores {
    preferences: Arc<dyn NotificationPreferencesRepository>,
    subscriptions: Arc<dyn PushSubscriptionRepository>,
    settings: Arc<dyn NotificationSettings>,
}

fn notification_stores<P, S>(preferences: Arc<P>, subscriptions: Arc<S>) -> NotificationStores
where
    P: NotificationPreferencesRepository + 'static,
    S: PushSubscriptionRepository + 'static,
{
    NotificationStores {
        settings: Arc::new(NotificationSettingsService::new(
            preferences.clone(),
            subscriptions.clone(),
        )),
        preferences,
        subscriptions,
    }
}

fn build_notification_stores(pool: Option<&DbPool>) -> NotificationStores {
    match pool {
        Some(pool) => notification_stores(
            Arc::new(DieselNotificationPreferencesRepository::new(pool.clone())),
            Arc::new(DieselPushSubscriptionRepository::new(pool.clone())),
        ),
        None => notification_stores(
            Arc::new(FixtureNotificationPreferencesRepository),
            Arc::new(FixturePushSubscriptionRepository),
        ),
    }
}

/// Account-side repositories, real or fixture.
struct AccountStores {
    directory: Arc<dyn UserDirectory>,
    login_events: Arc<dyn LoginEventRepository>,
}

fn build_account_stores(pool: Option<&DbPool>) -> AccountStores {
    match pool {
        Some(pool) => AccountStores {
            directory: Arc::new(DieselUserDirectory::new(pool.clone())),
            login_events: Arc::new(DieselLoginEventRepository::new(pool.clone())),
        },
        None => AccountStores {
            directory: Arc::new(FixtureUserDirectory),
            login_events: Arc::new(FixtureLoginEventRepository),
        },
    }
}

/// Construct the HTTP state from configuration.
pub(super) fn build_http_state(config: &ServerConfig, clock: Arc<dyn Clock>) -> HttpState {
    let pool = config.db_pool.as_ref();
    let email: Arc<dyn EmailSender> = config
        .email
        .clone()
        .unwrap_or_else(|| Arc::new(FixtureEmailSender));
    let push: Arc<dyn PushSender> = config
        .push
        .clone()
        .unwrap_or_else(|| Arc::new(FixturePushSender));
    let identity: Arc<dyn IdentityProvider> = config
        .identity
        .clone()
        .unwrap_or_else(|| Arc::new(FixtureIdentityProvider));
    let store: Arc<dyn RateLimitStore> = config
        .rate_limit_store
        .clone()
        .unwrap_or_else(|| Arc::new(InMemoryRateLimitStore::new(clock.clone())));

    let (coins, coins_query) = build_ledger(pool, &clock);
    let itinerary_views = build_itinerary_views(pool, coins.clone());
    let discovery = build_discovery(pool, &clock);
    let NotificationStores {
        preferences,
        subscriptions,
        settings: notification_settings,
    } = build_notification_stores(pool);
    let AccountStores {
        directory,
        login_events,
    } = build_account_stores(pool);

    let notifications: Arc<dyn NotificationDispatch> =
        Arc::new(NotificationDispatcher::new(NotificationPorts {
            preferences,
            subscriptions,
            directory: directory.clone(),
            email: email.clone(),
            push,
        }));
    let accounts = Arc::new(AccountService::new(
        AccountPorts {
            identity,
            login_events,
            directory,
            email,
            notifications: notifications.clone(),
            ledger: coins.clone(),
        },
        clock.clone(),
    ));

    let state = HttpState::new(
        HttpStatePorts {
            accounts,
            coins,
            coins_query,
            itinerary_views,
            notifications,
            notification_settings,
            discovery,
        },
        RateLimiter::new(store, clock),
    );
    match config.cron_secret.clone() {
        Some(secret) => state.with_cron_secret(secret),
        None => state,
    }
}
