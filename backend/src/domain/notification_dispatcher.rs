//! Notification dispatch across email and push.
//!
//! The dispatcher resolves the recipient's effective preferences, decides
//! whether the event is deliverable at all, then attempts each channel
//! independently. Channel failures are logged and swallowed; a push endpoint
//! reported gone is deleted on the spot.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::ports::{
    EmailSender, NotificationDispatch, NotificationPreferencesRepository, PushSender,
    PushSenderError, PushSubscriptionRepository, UserDirectory,
};
use super::service_support::{
    effective_preferences, map_directory_error, map_subscription_error,
};
use super::{
    BestEffort, DispatchOutcome, EmailAddress, Error, NotificationEvent, PushPayload,
    PushSubscription, RenderedNotification, SkipReason, UserId,
};

const UNKNOWN_ACTOR: &str = "Someone";

/// Driven ports used by [`NotificationDispatcher`].
#[derive(Clone)]
pub struct NotificationPorts {
    /// Stored preference flags.
    pub preferences: Arc<dyn NotificationPreferencesRepository>,
    /// Registered push endpoints.
    pub subscriptions: Arc<dyn PushSubscriptionRepository>,
    /// Names and email addresses.
    pub directory: Arc<dyn UserDirectory>,
    /// Email channel.
    pub email: Arc<dyn EmailSender>,
    /// Push channel.
    pub push: Arc<dyn PushSender>,
}

/// Notification dispatcher implementing [`NotificationDispatch`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    ports: NotificationPorts,
}

impl NotificationDispatcher {
    /// Create a dispatcher over `ports`.
    pub fn new(ports: NotificationPorts) -> Self {
        Self { ports }
    }

    async fn recipient_email(&self, user_id: &UserId) -> Result<Option<EmailAddress>, Error> {
        let contact = self
            .ports
            .directory
            .find_contact(user_id)
            .await
            .map_err(map_directory_error)?;
        Ok(contact.and_then(|contact| contact.email))
    }

    async fn actor_name(&self, user_id: &UserId) -> String {
        BestEffort::new("notifications.actor_lookup")
            .run(self.ports.directory.find_contact(user_id))
            .await
            .flatten()
            .map(|contact| contact.display_name)
            .unwrap_or_else(|| UNKNOWN_ACTOR.to_owned())
    }

    async fn deliver_email(&self, to: Option<EmailAddress>, rendered: &RenderedNotification) -> bool {
        let Some(to) = to else {
            return false;
        };
        let message = rendered.to_email(to);
        BestEffort::new("notifications.email")
            .run(self.ports.email.send(&message))
            .await
            .is_some()
    }

    async fn deliver_push(&self, subscriptions: &[PushSubscription], payload: &PushPayload) -> bool {
        let mut delivered = false;
        for subscription in subscriptions {
            match self.ports.push.send(subscription, payload).await {
                Ok(()) => delivered = true,
                Err(PushSenderError::Gone) => {
                    info!(
                        subscription_id = %subscription.id,
                        "push endpoint gone; removing subscription"
                    );
                    BestEffort::new("notifications.push_cleanup")
                        .run(self.ports.subscriptions.delete(&subscription.id))
                        .await;
                }
                Err(error) => {
                    warn!(
                        subscription_id = %subscription.id,
                        %error,
                        "push delivery failed"
                    );
                }
            }
        }
        delivered
    }
}

#[async_trait]
impl NotificationDispatch for NotificationDispatcher {
    async fn notify(&self, event: NotificationEvent) -> Result<DispatchOutcome, Error> {
        if event.kind.is_social() && event.recipient == event.actor {
            debug!(kind = ?event.kind, "skipping self notification");
            return Ok(DispatchOutcome::skipped(SkipReason::SelfNotification));
        }

        let preferences =
            effective_preferences(self.ports.preferences.as_ref(), &event.recipient).await?;
        if !event.kind.enabled_in(&preferences) || !(preferences.email || preferences.push) {
            debug!(kind = ?event.kind, recipient = %event.recipient, "notification disabled");
            return Ok(DispatchOutcome::skipped(SkipReason::PreferencesDisabled));
        }

        let email = if preferences.email {
            self.recipient_email(&event.recipient).await?
        } else {
            None
        };
        let subscriptions = if preferences.push {
            self.ports
                .subscriptions
                .list_for_user(&event.recipient)
                .await
                .map_err(map_subscription_error)?
        } else {
            Vec::new()
        };
        if email.is_none() && subscriptions.is_empty() {
            debug!(recipient = %event.recipient, "no contact channel for recipient");
            return Ok(DispatchOutcome::skipped(SkipReason::NoContactChannel));
        }

        let actor_name = if event.kind.is_social() {
            self.actor_name(&event.actor).await
        } else {
            String::new()
        };
        let rendered = RenderedNotification::render(&event, &actor_name);
        let payload = rendered.to_push(event.context.event_id.clone());

        let (email_sent, push_sent) = tokio::join!(
            self.deliver_email(email, &rendered),
            self.deliver_push(&subscriptions, &payload),
        );
        Ok(DispatchOutcome::attempted(email_sent || push_sent))
    }
}

#[cfg(test)]
#[path = "notification_dispatcher_tests.rs"]
mod tests;
