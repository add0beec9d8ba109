//! Notification events, preferences and delivery payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{EmailAddress, UserId};

/// Validation errors for notification inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationValidationError {
    /// Push endpoint was not an absolute `https` URL.
    #[error("push endpoint must be an absolute https URL")]
    InvalidEndpoint,
    /// Push subscription keys were blank.
    #[error("push subscription keys must not be empty")]
    MissingKeys,
}

/// Event categories that can notify a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone liked the recipient's content.
    Like,
    /// Someone commented on the recipient's content.
    Comment,
    /// The recipient's account was signed into.
    SignIn,
}

impl NotificationKind {
    /// Events caused by another user, as opposed to account alerts.
    pub fn is_social(self) -> bool {
        matches!(self, Self::Like | Self::Comment)
    }

    /// Whether the recipient's category flag allows this kind.
    pub fn enabled_in(self, preferences: &NotificationPreferences) -> bool {
        match self {
            Self::Like | Self::Comment => preferences.likes_comments,
            Self::SignIn => preferences.sign_in_alerts,
        }
    }
}

/// Free-form context rendered into the message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationContext {
    /// Identifier of the item the event concerns.
    pub event_id: Option<String>,
    /// Title of the item the event concerns.
    pub event_title: Option<String>,
    /// Body text such as the comment itself.
    pub content: Option<String>,
}

/// Something that happened to `recipient`, caused by `actor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// Event category.
    pub kind: NotificationKind,
    /// User to notify.
    pub recipient: UserId,
    /// User who caused the event.
    pub actor: UserId,
    /// Rendering context.
    pub context: NotificationContext,
}

/// Effective per-user notification switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    /// Email channel.
    pub email: bool,
    /// Push channel.
    pub push: bool,
    /// Likes and comments category.
    pub likes_comments: bool,
    /// New follower category.
    pub follows: bool,
    /// Sign-in alert category.
    pub sign_in_alerts: bool,
    /// Marketing category.
    pub marketing: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            likes_comments: true,
            follows: true,
            sign_in_alerts: true,
            marketing: false,
        }
    }
}

impl NotificationPreferences {
    /// Overlay stored flags onto these preferences.
    ///
    /// # Examples
    /// ```
    /// use itinera::domain::{NotificationPreferences, NotificationPreferencesPatch};
    ///
    /// let stored = NotificationPreferencesPatch {
    ///     likes_comments: Some(false),
    ///     ..Default::default()
    /// };
    /// let merged = NotificationPreferences::default().merge(&stored);
    /// assert!(!merged.likes_comments);
    /// assert!(merged.email);
    /// ```
    #[must_use]
    pub fn merge(self, patch: &NotificationPreferencesPatch) -> Self {
        Self {
            email: patch.email.unwrap_or(self.email),
            push: patch.push.unwrap_or(self.push),
            likes_comments: patch.likes_comments.unwrap_or(self.likes_comments),
            follows: patch.follows.unwrap_or(self.follows),
            sign_in_alerts: patch.sign_in_alerts.unwrap_or(self.sign_in_alerts),
            marketing: patch.marketing.unwrap_or(self.marketing),
        }
    }
}

/// Partially specified preferences, as stored or as sent by a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferencesPatch {
    /// Email channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,
    /// Push channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<bool>,
    /// Likes and comments category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes_comments: Option<bool>,
    /// New follower category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follows: Option<bool>,
    /// Sign-in alert category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_in_alerts: Option<bool>,
    /// Marketing category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing: Option<bool>,
}

impl From<NotificationPreferences> for NotificationPreferencesPatch {
    fn from(value: NotificationPreferences) -> Self {
        Self {
            email: Some(value.email),
            push: Some(value.push),
            likes_comments: Some(value.likes_comments),
            follows: Some(value.follows),
            sign_in_alerts: Some(value.sign_in_alerts),
            marketing: Some(value.marketing),
        }
    }
}

/// Why a notification was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Recipient and actor are the same user.
    SelfNotification,
    /// The recipient switched this category or every channel off.
    PreferencesDisabled,
    /// No enabled channel can reach the recipient.
    NoContactChannel,
}

impl SkipReason {
    /// Stable wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelfNotification => "self_notification",
            Self::PreferencesDisabled => "preferences_disabled",
            Self::NoContactChannel => "no_contact_channel",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// At least one channel delivered.
    pub sent: bool,
    /// Set when no channel was attempted.
    pub skipped_reason: Option<SkipReason>,
}

impl DispatchOutcome {
    /// Outcome for an event that was never attempted.
    pub const fn skipped(reason: SkipReason) -> Self {
        Self {
            sent: false,
            skipped_reason: Some(reason),
        }
    }

    /// Outcome after attempting delivery.
    pub const fn attempted(sent: bool) -> Self {
        Self {
            sent,
            skipped_reason: None,
        }
    }
}

/// Web push endpoint registered by a browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    /// Row identifier.
    pub id: Uuid,
    /// Subscriber.
    pub user_id: UserId,
    /// Push service endpoint.
    pub endpoint: Url,
    /// Client public key.
    pub p256dh: String,
    /// Client auth secret.
    pub auth: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// Validated registration request for a push endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPushSubscription {
    user_id: UserId,
    endpoint: Url,
    p256dh: String,
    auth: String,
}

impl NewPushSubscription {
    /// Validate the endpoint and keys.
    pub fn new(
        user_id: UserId,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<Self, NotificationValidationError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| NotificationValidationError::InvalidEndpoint)?;
        if endpoint.scheme() != "https" || endpoint.host_str().is_none() {
            return Err(NotificationValidationError::InvalidEndpoint);
        }
        let (p256dh, auth) = (p256dh.trim(), auth.trim());
        if p256dh.is_empty() || auth.is_empty() {
            return Err(NotificationValidationError::MissingKeys);
        }
        Ok(Self {
            user_id,
            endpoint,
            p256dh: p256dh.to_owned(),
            auth: auth.to_owned(),
        })
    }

    /// Subscriber.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Push service endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Client public key.
    pub fn p256dh(&self) -> &str {
        &self.p256dh
    }

    /// Client auth secret.
    pub fn auth(&self) -> &str {
        &self.auth
    }

    /// Materialise a stored subscription.
    pub fn into_subscription(self, id: Uuid, created_at: DateTime<Utc>) -> PushSubscription {
        PushSubscription {
            id,
            user_id: self.user_id,
            endpoint: self.endpoint,
            p256dh: self.p256dh,
            auth: self.auth,
            created_at,
        }
    }
}

/// Rendered transactional email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: EmailAddress,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
}

/// Rendered push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Item the notification links to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// Subject and body text for an event, shared by both channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    /// Headline.
    pub title: String,
    /// Body text.
    pub body: String,
}

impl RenderedNotification {
    /// Render `event` with `actor_name` as the subject of the sentence.
    pub fn render(event: &NotificationEvent, actor_name: &str) -> Self {
        let item = event
            .context
            .event_title
            .as_deref()
            .unwrap_or("your itinerary");
        let (title, lead) = match event.kind {
            NotificationKind::Like => (
                format!("{actor_name} liked {item}"),
                format!("{actor_name} liked {item}."),
            ),
            NotificationKind::Comment => (
                format!("{actor_name} commented on {item}"),
                format!("{actor_name} commented on {item}."),
            ),
            NotificationKind::SignIn => (
                "New sign-in to your account".to_owned(),
                "Your account was just signed into.".to_owned(),
            ),
        };
        let body = match event.context.content.as_deref() {
            Some(content) if !content.trim().is_empty() => format!("{lead}\n\n{content}"),
            _ => lead,
        };
        Self { title, body }
    }

    /// Email form of the rendered notification.
    pub fn to_email(&self, to: EmailAddress) -> EmailMessage {
        EmailMessage {
            to,
            subject: self.title.clone(),
            text: self.body.clone(),
        }
    }

    /// Push form of the rendered notification.
    pub fn to_push(&self, event_id: Option<String>) -> PushPayload {
        PushPayload {
            title: self.title.clone(),
            body: self.body.clone(),
            event_id,
        }
    }
}
