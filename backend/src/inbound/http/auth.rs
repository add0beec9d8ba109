//! Sign-in and password reset endpoints.
//!
//! ```text
//! POST /api/v1/login {"email":"ada@example.com","password":"…"}
//! POST /api/v1/auth/password-reset {"email":"ada@example.com"}
//! ```
//!
//! Both are throttled per client address and fail closed when the limiter
//! is unavailable.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{EmailAddress, Error, LoginCredentials, LoginValidationError, RateLimitPolicy};
use crate::inbound::http::ApiResult;
use crate::inbound::http::client_ip::RequestClient;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error, require};

const EMAIL: FieldName = FieldName::new("email");
const PASSWORD: FieldName = FieldName::new("password");

/// Generic acknowledgement returned whether or not the account exists.
pub const RESET_ACKNOWLEDGEMENT: &str =
    "If an account exists for that address, a reset link has been sent.";

/// Login request body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body returned after a successful sign-in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: String,
}

/// Password reset request body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

/// Password reset acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetResponse {
    pub success: bool,
    pub message: String,
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::InvalidEmail => Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "email", "code": "invalid_email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

fn parse_credentials(payload: LoginRequest) -> Result<LoginCredentials, Error> {
    let email = require(payload.email, EMAIL)?;
    let password = require(payload.password, PASSWORD)?;
    LoginCredentials::try_from_parts(&email, &password).map_err(map_login_validation_error)
}

fn parse_reset_email(payload: PasswordResetRequest) -> Result<EmailAddress, Error> {
    let raw = require(payload.email, EMAIL)?;
    EmailAddress::new(raw.as_str()).map_err(|err| invalid_value_error(EMAIL, &raw, err))
}

/// Authenticate with email and password and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 429, description = "Too many attempts", body = Error),
        (status = 503, description = "Identity provider or rate limiter unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    client: RequestClient,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let policy = RateLimitPolicy::SIGN_IN;
    state
        .rate_limiter
        .enforce(&policy.key_for(client.rate_limit_subject()), &policy)
        .await?;

    let credentials = parse_credentials(payload.into_inner())?;
    let user_id = state
        .accounts
        .sign_in(credentials, client.into_info())
        .await?;
    session.sign_in(&user_id)?;
    Ok(web::Json(LoginResponse {
        user_id: user_id.to_string(),
    }))
}

/// Request a password reset link.
///
/// The response does not reveal whether the address belongs to an account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Request accepted", body = PasswordResetResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 429, description = "Too many requests", body = Error),
        (status = 503, description = "Rate limiter unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "requestPasswordReset",
    security([])
)]
#[post("/auth/password-reset")]
pub async fn request_password_reset(
    state: web::Data<HttpState>,
    client: RequestClient,
    payload: web::Json<PasswordResetRequest>,
) -> ApiResult<web::Json<PasswordResetResponse>> {
    let policy = RateLimitPolicy::PASSWORD_RESET;
    state
        .rate_limiter
        .enforce(&policy.key_for(client.rate_limit_subject()), &policy)
        .await?;

    let email = parse_reset_email(payload.into_inner())?;
    state.accounts.request_password_reset(email).await?;
    Ok(web::Json(PasswordResetResponse {
        success: true,
        message: RESET_ACKNOWLEDGEMENT.to_owned(),
    }))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
