//! Handler tests for sign-in and password reset.

use std::net::SocketAddr;
use std::sync::Arc;

use super::*;
use crate::domain::ports::RateLimitStore;
use crate::domain::{ErrorCode, UserId};
use crate::inbound::http::test_utils::{
    MockPorts, failing_rate_limit_store, session_cookie, test_session_middleware,
};
use crate::outbound::rate_limit::InMemoryRateLimitStore;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::RETRY_AFTER;
use actix_web::{App, test::{self}};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};

const USER: &str = "3b9d2f10-7c4e-4a8b-9d61-0e5f4a3b2c1d";
const PEER: &str = "203.0.113.9:41000";

async fn app_with_store(
    ports: MockPorts,
    store: Arc<dyn RateLimitStore>,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .wrap(test_session_middleware())
            .app_data(web::Data::new(ports.into_state_with_store(store)))
            .service(
                web::scope("/api/v1")
                    .service(login)
                    .service(request_password_reset),
            ),
    )
    .await
}

fn memory_store() -> Arc<dyn RateLimitStore> {
    Arc::new(InMemoryRateLimitStore::new(Arc::new(DefaultClock)))
}

fn post(uri: &str, payload: Value) -> actix_http::Request {
    test::TestRequest::post()
        .uri(uri)
        .peer_addr(PEER.parse::<SocketAddr>().expect("peer addr"))
        .insert_header(("User-Agent", "itinera-tests/1.0"))
        .set_json(payload)
        .to_request()
}

#[actix_web::test]
async fn login_establishes_a_session() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_sign_in()
        .withf(|credentials, client| {
            credentials.email().as_ref() == "ada@example.com"
                && credentials.password() == "correct horse"
                && client.ip_address.map(|ip| ip.to_string()).as_deref() == Some("203.0.113.9")
                && client.user_agent.as_deref() == Some("itinera-tests/1.0")
        })
        .times(1)
        .returning(|_, _| Ok(UserId::new(USER).expect("user id")));
    let app = app_with_store(ports, memory_store()).await;

    let res = test::call_service(
        &app,
        post(
            "/api/v1/login",
            json!({"email": "ada@example.com", "password": "correct horse"}),
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res);
    assert!(!cookie.value().is_empty());
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({"userId": USER}));
}

#[actix_web::test]
async fn rejected_credentials_are_unauthorised() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_sign_in()
        .returning(|_, _| Err(Error::unauthorized("invalid credentials")));
    let app = app_with_store(ports, memory_store()).await;

    let res = test::call_service(
        &app,
        post(
            "/api/v1/login",
            json!({"email": "ada@example.com", "password": "nope"}),
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.response().cookies().next().is_none());
}

#[rstest]
#[case(json!({"password": "x"}), "email", "missing_field")]
#[case(json!({"email": "ada@example.com"}), "password", "missing_field")]
#[case(json!({"email": "not-an-email", "password": "x"}), "email", "invalid_email")]
#[case(json!({"email": "ada@example.com", "password": ""}), "password", "empty_password")]
fn login_payload_validation(#[case] payload: Value, #[case] field: &str, #[case] code: &str) {
    let payload: LoginRequest = serde_json::from_value(payload).expect("shape");

    let err = parse_credentials(payload).expect_err("invalid payload");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let details = err.details().expect("details");
    assert_eq!(details["field"], field);
    assert_eq!(details["code"], code);
}

#[actix_web::test]
async fn login_fails_closed_when_the_limiter_is_down() {
    let app = app_with_store(MockPorts::default(), failing_rate_limit_store()).await;

    let res = test::call_service(
        &app,
        post(
            "/api/v1/login",
            json!({"email": "ada@example.com", "password": "x"}),
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn reset_response_is_generic() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_request_password_reset()
        .withf(|email| email.as_ref() == "nobody@example.com")
        .times(1)
        .returning(|_| Ok(()));
    let app = app_with_store(ports, memory_store()).await;

    let res = test::call_service(
        &app,
        post(
            "/api/v1/auth/password-reset",
            json!({"email": "nobody@example.com"}),
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body,
        json!({"success": true, "message": RESET_ACKNOWLEDGEMENT})
    );
}

#[actix_web::test]
async fn malformed_reset_email_is_rejected() {
    let app = app_with_store(MockPorts::default(), memory_store()).await;

    let res = test::call_service(
        &app,
        post("/api/v1/auth/password-reset", json!({"email": "nope"})),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], "email");
}

#[actix_web::test]
async fn fourth_reset_from_one_address_is_throttled() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_request_password_reset()
        .times(3)
        .returning(|_| Ok(()));
    let app = app_with_store(ports, memory_store()).await;
    let payload = json!({"email": "ada@example.com"});

    for _ in 0..3 {
        let res = test::call_service(&app, post("/api/v1/auth/password-reset", payload.clone()))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
    let throttled =
        test::call_service(&app, post("/api/v1/auth/password-reset", payload)).await;

    assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = throttled
        .headers()
        .get(RETRY_AFTER)
        .expect("Retry-After header")
        .to_str()
        .expect("ascii")
        .parse()
        .expect("whole seconds");
    assert!((1..=900).contains(&retry_after));
    let body: Value = test::read_body_json(throttled).await;
    assert_eq!(body["code"], "too_many_requests");
    assert!(body["details"]["resetAt"].is_string());
}
