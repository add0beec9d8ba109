//! Server construction and middleware wiring.

mod config;
mod session_key;
mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use session_key::load_session_key;
pub use settings::{ServerSettings, SettingsError};

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use mockable::DefaultClock;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use itinera::Trace;
#[cfg(debug_assertions)]
use itinera::doc::ApiDoc;
use itinera::inbound::http::auth::{login, request_password_reset};
use itinera::inbound::http::client_ip::ClientIpSource;
use itinera::inbound::http::coins::{get_balance, list_transactions, spend_coins};
use itinera::inbound::http::cron::refresh_trending;
use itinera::inbound::http::health::{HealthState, live, ready};
use itinera::inbound::http::itineraries::{track_interaction, track_view};
use itinera::inbound::http::notifications::{send_notification, send_welcome};
use itinera::inbound::http::preferences::{
    get_notification_preferences, register_push_subscription, update_notification_preferences,
};
use itinera::inbound::http::state::HttpState;
use state_builders::build_http_state;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    client_ip_source: ClientIpSource,
    key: Key,
    cookie_secure: bool,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        client_ip_source,
        key,
        cookie_secure,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let api = web::scope("/api/v1")
        .wrap(session)
        .service(login)
        .service(request_password_reset)
        .service(get_balance)
        .service(list_transactions)
        .service(spend_coins)
        .service(track_view)
        .service(track_interaction)
        .service(send_notification)
        .service(send_welcome)
        .service(get_notification_preferences)
        .service(update_notification_preferences)
        .service(register_push_subscription)
        .service(refresh_trending);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(client_ip_source)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

#[cfg(feature = "metrics")]
fn build_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("itinera")
        .endpoint("/metrics")
        .build()
        .map_err(|err| std::io::Error::other(format!("configure Prometheus metrics: {err}")))
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config, Arc::new(DefaultClock)));
    #[cfg(feature = "metrics")]
    let metrics = build_metrics()?;
    let ServerConfig {
        key,
        cookie_secure,
        bind_addr,
        client_ip_source,
        ..
    } = config;

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            client_ip_source,
            key: key.clone(),
            cookie_secure,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
