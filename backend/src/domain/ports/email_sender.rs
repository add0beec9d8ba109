//! Port for transactional email delivery.

use async_trait::async_trait;
use tracing::info;

use crate::domain::EmailMessage;

use super::define_port_error;

define_port_error! {
    /// Errors raised by email delivery adapters.
    pub enum EmailSenderError {
        /// The provider could not be reached or timed out.
        Transport { message: String } =>
            "email transport failed: {message}",
        /// The provider refused the message.
        Rejected { status: u16, message: String } =>
            "email rejected with status {status}: {message}",
    }
}

/// Delivery contract for rendered email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Hand `message` to the provider. No retries.
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailSenderError>;
}

/// Sender used when no provider is configured; logs and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEmailSender;

#[async_trait]
impl EmailSender for FixtureEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailSenderError> {
        info!(subject = %message.subject, "email delivery not configured; message dropped");
        Ok(())
    }
}
