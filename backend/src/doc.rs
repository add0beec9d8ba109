//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer together
//! with the session cookie and cron bearer security schemes. Swagger UI
//! serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};

/// Enrich the generated document with the security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
        components.add_security_scheme(
            "CronBearer",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Itinera backend API",
        description = "Coins, itinerary analytics, notifications and account flows."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::request_password_reset,
        crate::inbound::http::coins::get_balance,
        crate::inbound::http::coins::list_transactions,
        crate::inbound::http::coins::spend_coins,
        crate::inbound::http::itineraries::track_view,
        crate::inbound::http::itineraries::track_interaction,
        crate::inbound::http::notifications::send_notification,
        crate::inbound::http::notifications::send_welcome,
        crate::inbound::http::preferences::get_notification_preferences,
        crate::inbound::http::preferences::update_notification_preferences,
        crate::inbound::http::preferences::register_push_subscription,
        crate::inbound::http::cron::refresh_trending,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "auth", description = "Sign-in and password reset"),
        (name = "coins", description = "Coin balance, history and spending"),
        (name = "itineraries", description = "View and interaction tracking"),
        (name = "notifications", description = "Social and welcome notifications"),
        (name = "users", description = "Per-user notification settings"),
        (name = "cron", description = "Scheduled maintenance jobs"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    #[rstest]
    #[case("/api/v1/coins")]
    #[case("/api/v1/coins/spend")]
    #[case("/api/v1/itineraries/{id}/view")]
    #[case("/api/v1/notifications/email")]
    #[case("/api/v1/users/me/push-subscriptions")]
    #[case("/api/v1/auth/password-reset")]
    #[case("/api/v1/cron/trending")]
    #[case("/health/ready")]
    fn documents_endpoint(#[case] path: &str) {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    fn error_schema_exposes_code_and_message() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;

        match schemas.get("Error").expect("Error schema") {
            RefOr::T(Schema::Object(obj)) => {
                assert!(obj.properties.contains_key("code"));
                assert!(obj.properties.contains_key("message"));
                assert!(obj.properties.contains_key("traceId"));
            }
            other => panic!("expected object schema, got {other:?}"),
        }
    }

    #[rstest]
    fn registers_both_security_schemes() {
        let doc = ApiDoc::openapi();
        let schemes = &doc
            .components
            .as_ref()
            .expect("components")
            .security_schemes;

        assert!(schemes.contains_key("SessionCookie"));
        assert!(schemes.contains_key("CronBearer"));
    }
}
