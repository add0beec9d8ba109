//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::RateLimiter;
use crate::domain::ports::{
    AccountCommand, CoinLedgerCommand, CoinLedgerQuery, DiscoveryCommand, ItineraryViewCommand,
    NotificationDispatch, NotificationSettings,
};

use super::cron::CronSecret;

/// Parameter object bundling the driving ports used by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountCommand>,
    pub coins: Arc<dyn CoinLedgerCommand>,
    pub coins_query: Arc<dyn CoinLedgerQuery>,
    pub itinerary_views: Arc<dyn ItineraryViewCommand>,
    pub notifications: Arc<dyn NotificationDispatch>,
    pub notification_settings: Arc<dyn NotificationSettings>,
    pub discovery: Arc<dyn DiscoveryCommand>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub coins: Arc<dyn CoinLedgerCommand>,
    pub coins_query: Arc<dyn CoinLedgerQuery>,
    pub itinerary_views: Arc<dyn ItineraryViewCommand>,
    pub notifications: Arc<dyn NotificationDispatch>,
    pub notification_settings: Arc<dyn NotificationSettings>,
    pub discovery: Arc<dyn DiscoveryCommand>,
    pub rate_limiter: RateLimiter,
    pub cron_secret: Option<CronSecret>,
}

impl HttpState {
    /// Construct state from the ports bundle and the request limiter.
    ///
    /// The cron endpoint stays disabled until [`Self::with_cron_secret`] is
    /// called.
    pub fn new(ports: HttpStatePorts, rate_limiter: RateLimiter) -> Self {
        let HttpStatePorts {
            accounts,
            coins,
            coins_query,
            itinerary_views,
            notifications,
            notification_settings,
            discovery,
        } = ports;
        Self {
            accounts,
            coins,
            coins_query,
            itinerary_views,
            notifications,
            notification_settings,
            discovery,
            rate_limiter,
            cron_secret: None,
        }
    }

    /// Enable `POST /cron/trending` for callers presenting `secret`.
    #[must_use]
    pub fn with_cron_secret(mut self, secret: CronSecret) -> Self {
        self.cron_secret = Some(secret);
        self
    }
}
