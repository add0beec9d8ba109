//! Port for the external identity provider.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{EmailAddress, LoginCredentials, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// Email and password did not match an account.
        InvalidCredentials => "invalid credentials",
        /// The provider could not be reached or timed out.
        Unavailable { message: String } =>
            "identity provider unavailable: {message}",
        /// The provider answered with an unexpected status.
        Rejected { status: u16, message: String } =>
            "identity provider rejected the request with status {status}: {message}",
    }
}

/// Authentication contract delegated to the identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials and return the account id.
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<UserId, IdentityProviderError>;

    /// Ask the provider to email a password reset link.
    async fn request_password_reset(&self, email: &EmailAddress)
    -> Result<(), IdentityProviderError>;
}

/// Development identity provider.
///
/// `admin@example.com` / `password` authenticates as a fixed user id; every
/// other pair is rejected. Reset requests are accepted and dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityProvider;

impl FixtureIdentityProvider {
    /// Account id returned for the fixture login.
    pub const USER_ID: Uuid = Uuid::from_u128(0x123e_4567_e89b_12d3_a456_4266_1417_4000);
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<UserId, IdentityProviderError> {
        if credentials.email().as_ref() == "admin@example.com" && credentials.password() == "password"
        {
            Ok(UserId::from_uuid(Self::USER_ID))
        } else {
            Err(IdentityProviderError::invalid_credentials())
        }
    }

    async fn request_password_reset(
        &self,
        _email: &EmailAddress,
    ) -> Result<(), IdentityProviderError> {
        Ok(())
    }
}
