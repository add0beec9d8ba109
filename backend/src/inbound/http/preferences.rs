//! Notification preference and push registration handlers.
//!
//! ```text
//! GET  /api/v1/users/me/notification-preferences
//! PUT  /api/v1/users/me/notification-preferences {"likesComments":false}
//! POST /api/v1/users/me/push-subscriptions
//!      {"endpoint":"https://push…","keys":{"p256dh":"…","auth":"…"}}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Error, NewPushSubscription, NotificationPreferences, NotificationPreferencesPatch,
    NotificationValidationError, PushSubscription, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error, require};

const ENDPOINT: FieldName = FieldName::new("endpoint");
const KEYS: FieldName = FieldName::new("keys");

const NO_STORE: (&str, &str) = ("Cache-Control", "private, no-store");

/// Browser push subscription keys.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PushKeys {
    pub p256dh: Option<String>,
    pub auth: Option<String>,
}

/// Push registration request, shaped like `PushSubscription.toJSON()`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionRequest {
    pub endpoint: Option<String>,
    pub keys: Option<PushKeys>,
}

/// Registered push endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionResponse {
    pub id: String,
    pub endpoint: String,
    pub created_at: String,
}

impl From<PushSubscription> for PushSubscriptionResponse {
    fn from(value: PushSubscription) -> Self {
        Self {
            id: value.id.to_string(),
            endpoint: value.endpoint.to_string(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

fn parse_push_subscription(
    user_id: UserId,
    payload: PushSubscriptionRequest,
) -> Result<NewPushSubscription, Error> {
    let endpoint = require(payload.endpoint, ENDPOINT)?;
    let keys = require(payload.keys, KEYS)?;
    let p256dh = keys.p256dh.unwrap_or_default();
    let auth = keys.auth.unwrap_or_default();
    NewPushSubscription::new(user_id, &endpoint, &p256dh, &auth).map_err(|err| match err {
        NotificationValidationError::InvalidEndpoint => {
            invalid_value_error(ENDPOINT, &endpoint, err)
        }
        NotificationValidationError::MissingKeys => invalid_value_error(KEYS, "", err),
    })
}

/// Effective notification switches of the signed-in user.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/notification-preferences",
    responses(
        (status = 200, description = "Merged preferences", body = NotificationPreferences),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "getNotificationPreferences"
)]
#[get("/users/me/notification-preferences")]
pub async fn get_notification_preferences(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let preferences = state.notification_settings.preferences(&user_id).await?;
    Ok(HttpResponse::Ok().insert_header(NO_STORE).json(preferences))
}

/// Change some notification switches; omitted flags keep their value.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/notification-preferences",
    request_body = NotificationPreferencesPatch,
    responses(
        (status = 200, description = "Merged preferences", body = NotificationPreferences),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateNotificationPreferences"
)]
#[put("/users/me/notification-preferences")]
pub async fn update_notification_preferences(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<NotificationPreferencesPatch>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let preferences = state
        .notification_settings
        .update_preferences(&user_id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().insert_header(NO_STORE).json(preferences))
}

/// Register a browser push endpoint for the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/push-subscriptions",
    request_body = PushSubscriptionRequest,
    responses(
        (status = 201, description = "Registered", body = PushSubscriptionResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "registerPushSubscription"
)]
#[post("/users/me/push-subscriptions")]
pub async fn register_push_subscription(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PushSubscriptionRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let subscription = parse_push_subscription(user_id, payload.into_inner())?;
    let stored = state
        .notification_settings
        .register_push(subscription)
        .await?;
    Ok(HttpResponse::Created().json(PushSubscriptionResponse::from(stored)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::inbound::http::test_utils::{
        MockPorts, TEST_SIGN_IN_PATH, signed_in_cookie, test_session_middleware, test_sign_in,
    };
    use actix_web::http::StatusCode;
    use actix_web::{App, test::{self}};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};
    use uuid::Uuid;

    const USER: &str = "c0ffee00-1234-4abc-8def-001122334455";

    fn user() -> UserId {
        UserId::new(USER).expect("user id")
    }

    fn defaults() -> NotificationPreferences {
        NotificationPreferences::default()
    }

    #[actix_web::test]
    async fn preferences_round_trip_through_the_settings_port() {
        let mut ports = MockPorts::default();
        ports
            .notification_settings
            .expect_preferences()
            .times(1)
            .returning(|_| Ok(defaults()));
        ports
            .notification_settings
            .expect_update_preferences()
            .withf(|id, patch| id.as_ref() == USER && patch.likes_comments == Some(false))
            .times(1)
            .returning(|_, patch| Ok(defaults().merge(&patch)));
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .app_data(web::Data::new(ports.into_state()))
                .route(TEST_SIGN_IN_PATH, web::post().to(test_sign_in))
                .service(
                    web::scope("/api/v1")
                        .service(get_notification_preferences)
                        .service(update_notification_preferences),
                ),
        )
        .await;
        let cookie = signed_in_cookie(&app, &user()).await;

        let read = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/users/me/notification-preferences")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(read.status(), StatusCode::OK);
        assert_eq!(
            read.headers().get("cache-control").and_then(|v| v.to_str().ok()),
            Some("private, no-store")
        );
        let body: Value = test::read_body_json(read).await;
        assert_eq!(body["likesComments"], true);
        assert_eq!(body["marketing"], false);

        let updated = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/users/me/notification-preferences")
                .cookie(cookie)
                .set_json(json!({"likesComments": false}))
                .to_request(),
        )
        .await;
        assert_eq!(updated.status(), StatusCode::OK);
        let body: Value = test::read_body_json(updated).await;
        assert_eq!(body["likesComments"], false);
        assert_eq!(body["email"], true);
    }

    #[actix_web::test]
    async fn push_registration_returns_created() {
        let mut ports = MockPorts::default();
        ports
            .notification_settings
            .expect_register_push()
            .withf(|sub| sub.user_id().as_ref() == USER && sub.p256dh() == "BNc")
            .times(1)
            .returning(|sub| Ok(sub.into_subscription(Uuid::nil(), Utc::now())));
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .app_data(web::Data::new(ports.into_state()))
                .route(TEST_SIGN_IN_PATH, web::post().to(test_sign_in))
                .service(web::scope("/api/v1").service(register_push_subscription)),
        )
        .await;
        let cookie = signed_in_cookie(&app, &user()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/users/me/push-subscriptions")
                .cookie(cookie)
                .set_json(json!({
                    "endpoint": "https://push.example.com/send/abc",
                    "keys": {"p256dh": "BNc", "auth": "tBH"}
                }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["endpoint"], "https://push.example.com/send/abc");
        assert_eq!(body["id"], Uuid::nil().to_string());
    }

    #[rstest]
    #[case(json!({"keys": {"p256dh": "a", "auth": "b"}}), "endpoint", "missing_field")]
    #[case(json!({"endpoint": "https://push.example.com/x"}), "keys", "missing_field")]
    #[case(json!({"endpoint": "http://push.example.com/x", "keys": {"p256dh": "a", "auth": "b"}}), "endpoint", "invalid_value")]
    #[case(json!({"endpoint": "https://push.example.com/x", "keys": {"p256dh": "a"}}), "keys", "invalid_value")]
    fn push_payload_validation(#[case] payload: Value, #[case] field: &str, #[case] code: &str) {
        let payload: PushSubscriptionRequest = serde_json::from_value(payload).expect("shape");

        let err = parse_push_subscription(user(), payload).expect_err("invalid payload");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["field"], field);
        assert_eq!(details["code"], code);
    }
}
