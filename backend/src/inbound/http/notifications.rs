//! Notification trigger endpoints.
//!
//! ```text
//! POST /api/v1/notifications/email
//!      {"type":"like","recipientUserId":"…","eventId":"…","eventTitle":"…","content":"…"}
//! POST /api/v1/notifications/welcome
//! ```
//!
//! The signed-in user is always the actor; clients cannot raise account
//! alerts such as `sign_in` on someone else's behalf.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    DispatchOutcome, Error, NotificationContext, NotificationEvent, NotificationKind,
    RateLimitPolicy, SkipReason, UserId, WelcomeOutcome,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error, require};

const KIND: FieldName = FieldName::new("type");
const RECIPIENT: FieldName = FieldName::new("recipientUserId");

/// Request body for a social notification.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotificationRequest {
    /// `like` or `comment`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub recipient_user_id: Option<String>,
    pub event_id: Option<String>,
    pub event_title: Option<String>,
    pub content: Option<String>,
}

/// Dispatch acknowledgement.
///
/// `skipped` and `reason` are present only when nothing was attempted.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
}

impl From<DispatchOutcome> for NotificationResponse {
    fn from(value: DispatchOutcome) -> Self {
        Self {
            success: true,
            skipped: value.skipped_reason.map(|_| true),
            reason: value.skipped_reason,
        }
    }
}

/// Welcome acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeResponse {
    pub success: bool,
    pub email_sent: bool,
    pub bonus_awarded: bool,
}

impl From<WelcomeOutcome> for WelcomeResponse {
    fn from(value: WelcomeOutcome) -> Self {
        Self {
            success: true,
            email_sent: value.email_sent,
            bonus_awarded: value.bonus.is_some_and(|bonus| bonus.is_awarded()),
        }
    }
}

fn parse_social_kind(raw: &str) -> Result<NotificationKind, Error> {
    match raw {
        "like" => Ok(NotificationKind::Like),
        "comment" => Ok(NotificationKind::Comment),
        other => Err(invalid_value_error(KIND, other, "type must be `like` or `comment`")),
    }
}

fn parse_event(actor: UserId, payload: EmailNotificationRequest) -> Result<NotificationEvent, Error> {
    let kind = parse_social_kind(&require(payload.kind, KIND)?)?;
    let raw_recipient = require(payload.recipient_user_id, RECIPIENT)?;
    let recipient = UserId::new(&raw_recipient)
        .map_err(|err| invalid_value_error(RECIPIENT, &raw_recipient, err))?;
    Ok(NotificationEvent {
        kind,
        recipient,
        actor,
        context: NotificationContext {
            event_id: payload.event_id,
            event_title: payload.event_title,
            content: payload.content,
        },
    })
}

/// Notify another user that the caller liked or commented on their content.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/email",
    request_body = EmailNotificationRequest,
    responses(
        (status = 200, description = "Dispatched or skipped", body = NotificationResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Too many requests", body = Error),
        (status = 500, description = "Internal server error", body = Error),
        (status = 503, description = "Rate limiter unavailable", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "sendNotification"
)]
#[post("/notifications/email")]
pub async fn send_notification(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<EmailNotificationRequest>,
) -> ApiResult<web::Json<NotificationResponse>> {
    let actor = session.require_user_id()?;
    let policy = RateLimitPolicy::NOTIFICATION_EMAIL;
    let key = policy.key_for(&actor);
    // Malformed payloads are rejected without spending the caller's budget.
    let event = parse_event(actor, payload.into_inner())?;
    state.rate_limiter.enforce(&key, &policy).await?;

    let outcome = state.notifications.notify(event).await?;
    Ok(web::Json(outcome.into()))
}

/// Send the welcome email and grant the one-time welcome bonus.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/welcome",
    responses(
        (status = 200, description = "Welcome processed", body = WelcomeResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 429, description = "Too many requests", body = Error),
        (status = 503, description = "Email provider or rate limiter unavailable", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "sendWelcome"
)]
#[post("/notifications/welcome")]
pub async fn send_welcome(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<WelcomeResponse>> {
    let user_id = session.require_user_id()?;
    let policy = RateLimitPolicy::WELCOME_EMAIL;
    state
        .rate_limiter
        .enforce(&policy.key_for(&user_id), &policy)
        .await?;

    let outcome = state.accounts.welcome(&user_id).await?;
    Ok(web::Json(outcome.into()))
}

#[cfg(test)]
#[path = "notifications_tests.rs"]
mod tests;
