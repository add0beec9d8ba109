//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::cookie::Key;

use itinera::domain::ports::{EmailSender, IdentityProvider, PushSender, RateLimitStore};
use itinera::inbound::http::client_ip::ClientIpSource;
use itinera::inbound::http::cron::CronSecret;
use itinera::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
///
/// Every optional backend left unset is replaced by an in-process or fixture
/// adapter when the HTTP state is assembled.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) rate_limit_store: Option<Arc<dyn RateLimitStore>>,
    pub(crate) email: Option<Arc<dyn EmailSender>>,
    pub(crate) push: Option<Arc<dyn PushSender>>,
    pub(crate) identity: Option<Arc<dyn IdentityProvider>>,
    pub(crate) cron_secret: Option<CronSecret>,
    pub(crate) client_ip_source: ClientIpSource,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            bind_addr,
            db_pool: None,
            rate_limit_store: None,
            email: None,
            push: None,
            identity: None,
            cron_secret: None,
            client_ip_source: ClientIpSource::Peer,
        }
    }

    /// Attach a database connection pool for the Diesel repositories.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Share rate-limit counters through `store` instead of process memory.
    #[must_use]
    pub fn with_rate_limit_store(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.rate_limit_store = Some(store);
        self
    }

    #[must_use]
    pub fn with_email_sender(mut self, email: Arc<dyn EmailSender>) -> Self {
        self.email = Some(email);
        self
    }

    #[must_use]
    pub fn with_push_sender(mut self, push: Arc<dyn PushSender>) -> Self {
        self.push = Some(push);
        self
    }

    #[must_use]
    pub fn with_identity_provider(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    #[must_use]
    pub fn with_cron_secret(mut self, secret: Option<CronSecret>) -> Self {
        self.cron_secret = secret;
        self
    }

    #[must_use]
    pub fn with_client_ip_source(mut self, source: ClientIpSource) -> Self {
        self.client_ip_source = source;
        self
    }
}
