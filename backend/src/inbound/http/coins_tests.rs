//! Handler tests for the coin endpoints.

use super::*;
use crate::domain::{CoinBalance, ErrorCode};
use crate::inbound::http::test_utils::{
    MockPorts, TEST_SIGN_IN_PATH, signed_in_cookie, test_session_middleware, test_sign_in,
};
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test::{self}};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use serde_json::Value;
use uuid::Uuid;

const USER: &str = "0b6c7c7e-2f0a-4c8e-9d59-1f3f2f7f3a10";

fn user() -> UserId {
    UserId::new(USER).expect("fixture user id")
}

async fn app(
    ports: MockPorts,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .wrap(test_session_middleware())
            .app_data(web::Data::new(ports.into_state()))
            .route(TEST_SIGN_IN_PATH, web::post().to(test_sign_in))
            .service(
                web::scope("/api/v1")
                    .service(get_balance)
                    .service(list_transactions)
                    .service(spend_coins),
            ),
    )
    .await
}

fn transaction(amount: i64) -> CoinTransaction {
    CoinTransaction {
        id: Uuid::nil(),
        user_id: user(),
        amount,
        action: CoinAction::new("itinerary_boost").expect("action"),
        reference: Some(CoinReference::new("itinerary", "42").expect("reference")),
        metadata: json!({}),
        created_at: Utc
            .with_ymd_and_hms(2026, 5, 1, 9, 30, 0)
            .single()
            .expect("timestamp"),
    }
}

#[actix_web::test]
async fn balance_requires_a_session() {
    let app = app(MockPorts::default()).await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/v1/coins").to_request())
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn balance_reports_camel_case_totals() {
    let mut ports = MockPorts::default();
    ports
        .coins_query
        .expect_balance()
        .withf(|id| id.as_ref() == USER)
        .times(1)
        .returning(|id| {
            Ok(CoinBalance {
                user_id: id.clone(),
                balance: 35,
                lifetime_earned: 60,
                lifetime_spent: 25,
            })
        });
    let app = app(ports).await;
    let cookie = signed_in_cookie(&app, &user()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/coins")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body,
        json!({"balance": 35, "lifetimeEarned": 60, "lifetimeSpent": 25})
    );
}

#[actix_web::test]
async fn transactions_pass_filters_to_the_query() {
    let mut ports = MockPorts::default();
    ports
        .coins_query
        .expect_transactions()
        .withf(|_, query| {
            query.limit() == TransactionQuery::MAX_LIMIT
                && query.offset() == 10
                && query.kind() == Some(TransactionKind::Spend)
        })
        .times(1)
        .returning(|_, query| {
            Ok(TransactionPage {
                transactions: vec![transaction(-5)],
                total: 11,
                limit: query.limit(),
                offset: query.offset(),
            })
        });
    let app = app(ports).await;
    let cookie = signed_in_cookie(&app, &user()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/coins/transactions?limit=500&offset=10&type=spend")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["total"], 11);
    assert_eq!(body["limit"], 50);
    assert_eq!(body["transactions"][0]["amount"], -5);
    assert_eq!(body["transactions"][0]["referenceType"], "itinerary");
    assert_eq!(body["transactions"][0]["createdAt"], "2026-05-01T09:30:00+00:00");
}

#[actix_web::test]
async fn unknown_transaction_type_is_rejected() {
    let app = app(MockPorts::default()).await;
    let cookie = signed_in_cookie(&app, &user()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/coins/transactions?type=gift")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], "type");
    assert_eq!(body["details"]["value"], "gift");
}

#[actix_web::test]
async fn spend_returns_the_debit() {
    let mut ports = MockPorts::default();
    ports
        .coins
        .expect_spend()
        .times(1)
        .returning(|_| Ok(transaction(-5)));
    let app = app(ports).await;
    let cookie = signed_in_cookie(&app, &user()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/coins/spend")
            .cookie(cookie)
            .set_json(json!({
                "amount": 5,
                "action": "itinerary_boost",
                "referenceType": "itinerary",
                "referenceId": "42"
            }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["amount"], -5);
    assert_eq!(body["action"], "itinerary_boost");
}

#[actix_web::test]
async fn insufficient_balance_is_a_conflict() {
    let mut ports = MockPorts::default();
    ports
        .coins
        .expect_spend()
        .returning(|_| Err(Error::conflict("insufficient balance")));
    let app = app(ports).await;
    let cookie = signed_in_cookie(&app, &user()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/coins/spend")
            .cookie(cookie)
            .set_json(json!({"amount": 500, "action": "itinerary_boost"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn rejected_spends_do_not_count_against_the_limit() {
    let mut ports = MockPorts::default();
    ports
        .coins
        .expect_spend()
        .times(1)
        .returning(|_| Ok(transaction(-5)));
    let app = app(ports).await;
    let cookie = signed_in_cookie(&app, &user()).await;
    let spend = |payload: Value| {
        test::TestRequest::post()
            .uri("/api/v1/coins/spend")
            .cookie(cookie.clone())
            .set_json(payload)
            .to_request()
    };

    for _ in 0..=RateLimitPolicy::CREATOR_API.max_requests() {
        let res = test::call_service(&app, spend(json!({"amount": 0, "action": "boost"}))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
    let res = test::call_service(
        &app,
        spend(json!({"amount": 5, "action": "itinerary_boost"})),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
}

#[rstest]
#[case(json!({"action": "boost"}), "amount", "missing_field")]
#[case(json!({"amount": 0, "action": "boost"}), "amount", "invalid_value")]
#[case(json!({"amount": -3, "action": "boost"}), "amount", "invalid_value")]
#[case(json!({"amount": 5}), "action", "missing_field")]
#[case(json!({"amount": 5, "action": "Not Snake"}), "action", "invalid_value")]
#[case(json!({"amount": 5, "action": "boost", "referenceType": "itinerary"}), "referenceId", "missing_field")]
#[case(json!({"amount": 5, "action": "boost", "referenceId": "42"}), "referenceType", "missing_field")]
#[case(json!({"amount": 5, "action": "boost", "referenceType": "itinerary", "referenceId": " "}), "referenceId", "invalid_value")]
fn spend_payload_validation(#[case] payload: Value, #[case] field: &str, #[case] code: &str) {
    let payload: SpendCoinsRequest = serde_json::from_value(payload).expect("payload shape");

    let err = parse_spend_request(user(), payload).expect_err("invalid payload");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let details = err.details().expect("details");
    assert_eq!(details["field"], field);
    assert_eq!(details["code"], code);
}

#[rstest]
fn history_defaults_apply_without_parameters() {
    let query = parse_transactions_query(TransactionsParams::default()).expect("valid");

    assert_eq!(query.limit(), TransactionQuery::DEFAULT_LIMIT);
    assert_eq!(query.offset(), 0);
    assert_eq!(query.kind(), None);
}
