//! Driving port for account flows: sign-in, password reset and welcome.

use async_trait::async_trait;

use crate::domain::{ClientInfo, EmailAddress, Error, LoginCredentials, UserId, WelcomeOutcome};

/// Inbound contract for account use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Authenticate, then start the sign-in side effects (audit record and
    /// sign-in alert) in the background. They never fail or delay sign-in.
    async fn sign_in(
        &self,
        credentials: LoginCredentials,
        client: ClientInfo,
    ) -> Result<UserId, Error>;

    /// Request a reset link. Succeeds whether or not the account exists.
    async fn request_password_reset(&self, email: EmailAddress) -> Result<(), Error>;

    /// Grant the one-time welcome bonus, then send the welcome email.
    async fn welcome(&self, user_id: &UserId) -> Result<WelcomeOutcome, Error>;
}
