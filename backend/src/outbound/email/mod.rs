//! Transactional email over an HTTP provider API.
//!
//! The provider accepts `POST {api_url}` with a bearer key and a JSON body of
//! `{from, to, subject, text}`. Delivery internals (templates, bounces) stay
//! with the provider.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use crate::domain::EmailMessage;
use crate::domain::ports::{EmailSender, EmailSenderError};

use super::http_support::body_preview;

/// Connection details for the email provider.
#[derive(Debug, Clone)]
pub struct EmailProviderConfig {
    /// Send endpoint.
    pub api_url: Url,
    /// Bearer API key.
    pub api_key: String,
    /// Sender address, e.g. `Itinera <hello@itinera.app>`.
    pub from: String,
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// Email sender posting to the provider API.
pub struct HttpEmailSender {
    client: Client,
    config: EmailProviderConfig,
}

impl HttpEmailSender {
    /// Create a sender sharing `client`.
    pub fn new(client: Client, config: EmailProviderConfig) -> Self {
        Self { client, config }
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> EmailSenderError {
    if status.is_server_error() {
        EmailSenderError::transport(format!("status {}", status.as_u16()))
    } else {
        EmailSenderError::rejected(status.as_u16(), body_preview(body))
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailSenderError> {
        let body = SendEmailBody {
            from: self.config.from.as_str(),
            to: [message.to.as_ref()],
            subject: message.subject.as_str(),
            text: message.text.as_str(),
        };
        let response = self
            .client
            .post(self.config.api_url.clone())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| EmailSenderError::transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "email accepted by provider");
            return Ok(());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| EmailSenderError::transport(err.to_string()))?;
        Err(map_status_error(status, bytes.as_ref()))
    }
}
