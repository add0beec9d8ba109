//! Account flows: sign-in, password reset and onboarding welcome.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use super::ports::{
    AccountCommand, CoinLedgerCommand, EmailSender, EmailSenderError, IdentityProvider,
    IdentityProviderError, LoginEventRepository, NotificationDispatch, UserDirectory,
};
use super::service_support::map_directory_error;
use super::{
    AwardOutcome, BestEffort, ClientInfo, EmailAddress, EmailMessage, Error, LoginCredentials,
    LoginEvent, Milestone, NotificationContext, NotificationEvent, NotificationKind, UserId,
};

/// Result of the onboarding welcome.
#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeOutcome {
    /// The welcome email was handed to the provider.
    pub email_sent: bool,
    /// Ledger answer for the welcome bonus; `None` when the award failed.
    pub bonus: Option<AwardOutcome>,
}

/// Driven ports used by [`AccountService`].
#[derive(Clone)]
pub struct AccountPorts {
    /// External identity provider.
    pub identity: Arc<dyn IdentityProvider>,
    /// Sign-in audit log.
    pub login_events: Arc<dyn LoginEventRepository>,
    /// Names and email addresses.
    pub directory: Arc<dyn UserDirectory>,
    /// Transactional email.
    pub email: Arc<dyn EmailSender>,
    /// Sign-in alerts.
    pub notifications: Arc<dyn NotificationDispatch>,
    /// Welcome bonus.
    pub ledger: Arc<dyn CoinLedgerCommand>,
}

/// Account service implementing [`AccountCommand`].
#[derive(Clone)]
pub struct AccountService {
    ports: AccountPorts,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Create a service over `ports`.
    pub fn new(ports: AccountPorts, clock: Arc<dyn Clock>) -> Self {
        Self { ports, clock }
    }

    fn map_identity_error(error: IdentityProviderError) -> Error {
        match error {
            IdentityProviderError::InvalidCredentials => Error::unauthorized("invalid credentials"),
            IdentityProviderError::Unavailable { message } => {
                Error::service_unavailable(format!("identity provider unavailable: {message}"))
            }
            IdentityProviderError::Rejected { status, message } => Error::internal(format!(
                "identity provider answered {status}: {message}"
            )),
        }
    }

    fn map_email_error(error: EmailSenderError) -> Error {
        Error::service_unavailable(format!("welcome email not delivered: {error}"))
    }

    /// Welcome email; the bonus line appears only for a fresh credit.
    fn welcome_message(to: EmailAddress, display_name: &str, bonus: Option<i64>) -> EmailMessage {
        let mut text = format!(
            "Hi {display_name},\n\nYour account is ready. Share your first itinerary \
             and start collecting coins."
        );
        if let Some(amount) = bonus {
            text.push_str(&format!(
                " We've added {amount} coins to your balance to get you going."
            ));
        }
        EmailMessage {
            to,
            subject: "Welcome to Itinera".to_owned(),
            text,
        }
    }
}

#[async_trait]
impl AccountCommand for AccountService {
    async fn sign_in(
        &self,
        credentials: LoginCredentials,
        client: ClientInfo,
    ) -> Result<UserId, Error> {
        let user_id = self
            .ports
            .identity
            .authenticate(&credentials)
            .await
            .map_err(Self::map_identity_error)?;

        let event = LoginEvent {
            user_id: user_id.clone(),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
            created_at: self.clock.utc(),
        };
        let alert = NotificationEvent {
            kind: NotificationKind::SignIn,
            recipient: user_id.clone(),
            actor: user_id.clone(),
            context: NotificationContext {
                content: event.ip_address.map(|ip| format!("Signed in from {ip}.")),
                ..NotificationContext::default()
            },
        };

        // Audit and alert run detached so a slow store never delays sign-in.
        let login_events = Arc::clone(&self.ports.login_events);
        BestEffort::new("audit.login_event")
            .spawn(async move { login_events.record(&event).await });
        let notifications = Arc::clone(&self.ports.notifications);
        BestEffort::new("notifications.sign_in_alert")
            .spawn(async move { notifications.notify(alert).await });

        info!(user_id = %user_id, "user signed in");
        Ok(user_id)
    }

    async fn request_password_reset(&self, email: EmailAddress) -> Result<(), Error> {
        match self.ports.identity.request_password_reset(&email).await {
            Ok(()) => info!("password reset requested"),
            Err(error) => warn!(%error, "password reset request failed"),
        }
        Ok(())
    }

    async fn welcome(&self, user_id: &UserId) -> Result<WelcomeOutcome, Error> {
        let contact = self
            .ports
            .directory
            .find_contact(user_id)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| Error::not_found("user not found"))?;

        let bonus = BestEffort::new("coins.welcome_bonus")
            .run(async {
                let request = Milestone::WELCOME_BONUS
                    .award(user_id.clone(), user_id.to_string(), json!({}))
                    .map_err(|err| Error::internal(err.to_string()))?;
                self.ports.ledger.award(request).await
            })
            .await;
        let credited = match &bonus {
            Some(AwardOutcome::Awarded(transaction)) => Some(transaction.amount),
            _ => None,
        };

        let email_sent = match contact.email {
            Some(to) => {
                let message = Self::welcome_message(to, &contact.display_name, credited);
                self.ports
                    .email
                    .send(&message)
                    .await
                    .map_err(Self::map_email_error)?;
                true
            }
            None => false,
        };

        Ok(WelcomeOutcome { email_sent, bonus })
    }
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
