//! Identity provider over a GoTrue-compatible HTTP API.
//!
//! - `POST {base}/token?grant_type=password` with `{email, password}` returns
//!   `{user: {id}}` on success and 400/401 for bad credentials.
//! - `POST {base}/recover` with `{email}` starts a password reset.
//!
//! Both calls carry the project's anonymous key in the `apikey` header.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{EmailAddress, LoginCredentials, UserId};

use super::http_support::body_preview;

/// Connection details for the identity provider.
#[derive(Debug, Clone)]
pub struct IdentityProviderConfig {
    /// Base URL of the auth API, e.g. `https://auth.example.com/auth/v1/`.
    pub base_url: Url,
    /// Anonymous project key.
    pub api_key: String,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RecoverBody<'a> {
    email: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
}

/// Identity provider adapter.
pub struct HttpIdentityProvider {
    client: Client,
    config: IdentityProviderConfig,
}

impl HttpIdentityProvider {
    /// Create an adapter sharing `client`.
    pub fn new(client: Client, config: IdentityProviderConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityProviderError> {
        self.config
            .base_url
            .join(path)
            .map_err(|err| IdentityProviderError::unavailable(format!("invalid auth url: {err}")))
    }
}

fn map_transport_error(error: reqwest::Error) -> IdentityProviderError {
    IdentityProviderError::unavailable(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
            IdentityProviderError::invalid_credentials()
        }
        _ if status.is_server_error() => {
            IdentityProviderError::unavailable(format!("status {}", status.as_u16()))
        }
        _ => IdentityProviderError::rejected(status.as_u16(), body_preview(body)),
    }
}

fn parse_user_id(body: &[u8]) -> Result<UserId, IdentityProviderError> {
    let token: TokenResponse = serde_json::from_slice(body).map_err(|err| {
        IdentityProviderError::rejected(200_u16, format!("unexpected token response: {err}"))
    })?;
    UserId::new(&token.user.id).map_err(|err| {
        IdentityProviderError::rejected(200_u16, format!("invalid user id: {err}"))
    })
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<UserId, IdentityProviderError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let response = self
            .client
            .post(url)
            .header("apikey", self.config.api_key.as_str())
            .json(&PasswordGrant {
                email: credentials.email().as_ref(),
                password: credentials.password(),
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_user_id(body.as_ref())
    }

    async fn request_password_reset(
        &self,
        email: &EmailAddress,
    ) -> Result<(), IdentityProviderError> {
        let response = self
            .client
            .post(self.endpoint("recover")?)
            .header("apikey", self.config.api_key.as_str())
            .json(&RecoverBody {
                email: email.as_ref(),
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!("password reset accepted by identity provider");
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }
}
