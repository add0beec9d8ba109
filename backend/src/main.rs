//! Backend entry-point: loads settings, connects backends and serves the API.

mod server;

use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use itinera::inbound::http::client_ip::ClientIpSource;
use itinera::inbound::http::cron::CronSecret;
use itinera::inbound::http::health::HealthState;
use itinera::outbound::email::HttpEmailSender;
use itinera::outbound::http_support::build_client;
use itinera::outbound::identity::HttpIdentityProvider;
use itinera::outbound::persistence::{DbPool, PoolConfig};
use itinera::outbound::push::HttpPushGateway;
use itinera::outbound::rate_limit::RedisRateLimitStore;

use server::{ServerConfig, ServerSettings, create_server, load_session_key};

fn startup_error(context: &str, error: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {error}"))
}

async fn build_config(settings: &ServerSettings) -> std::io::Result<ServerConfig> {
    let key = load_session_key(
        &settings.session_key_file(),
        cfg!(debug_assertions) || settings.session_allow_ephemeral,
    )
    .map_err(|err| startup_error("session key", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| startup_error("bind address", err))?;
    let timeout = settings.outbound_timeout();

    let client_ip_source = if settings.trust_forwarded_headers {
        ClientIpSource::Forwarded
    } else {
        ClientIpSource::Peer
    };
    let mut config = ServerConfig::new(key, settings.session_cookie_secure, bind_addr)
        .with_cron_secret(settings.cron_secret.clone().and_then(CronSecret::new))
        .with_client_ip_source(client_ip_source);

    if let Some(url) = settings.database_url.as_deref() {
        let pool = DbPool::new(PoolConfig::new(url).with_connection_timeout(timeout))
            .await
            .map_err(|err| startup_error("database pool", err))?;
        pool.run_migrations()
            .await
            .map_err(|err| startup_error("database migrations", err))?;
        config = config.with_db_pool(pool);
    } else {
        warn!("no database configured; ledger and view counters are in-memory");
    }

    if let Some(url) = settings.redis_url.as_deref() {
        let store = RedisRateLimitStore::connect(url, timeout)
            .await
            .map_err(|err| startup_error("redis", err))?;
        config = config.with_rate_limit_store(Arc::new(store));
    } else {
        info!("no redis configured; rate limits are per process");
    }

    let client = build_client(timeout).map_err(|err| startup_error("http client", err))?;
    let settings_error = |err| startup_error("settings", err);
    if let Some(email) = settings.email_provider().map_err(settings_error)? {
        config = config.with_email_sender(Arc::new(HttpEmailSender::new(client.clone(), email)));
    }
    if let Some(gateway) = settings.push_gateway_url().map_err(settings_error)? {
        config = config.with_push_sender(Arc::new(HttpPushGateway::new(client.clone(), gateway)));
    }
    if let Some(identity) = settings.identity_provider().map_err(settings_error)? {
        config =
            config.with_identity_provider(Arc::new(HttpIdentityProvider::new(client, identity)));
    }
    Ok(config)
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().map_err(|err| startup_error("settings", err))?;
    let config = build_config(&settings).await?;

    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}
