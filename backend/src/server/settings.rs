//! Server settings loaded via OrthoConfig.
//!
//! Every field can come from CLI flags, `ITINERA_*` environment variables or
//! a configuration file. Optional backends stay unset when not configured,
//! and the server falls back to in-process or fixture adapters for them.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use itinera::outbound::email::EmailProviderConfig;
use itinera::outbound::identity::IdentityProviderConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";

/// Errors raised when settings are present but unusable.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind host '{value}': {source}")]
    InvalidHost {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid URL in {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{name} requires {missing} to be set as well")]
    Incomplete {
        name: &'static str,
        missing: &'static str,
    },
}

/// Runtime configuration for the HTTP server and its adapters.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ITINERA")]
pub struct ServerSettings {
    /// Bind address; defaults to all interfaces.
    pub host: Option<String>,
    /// Bind port; defaults to 8080.
    pub port: Option<u16>,
    /// PostgreSQL URL. Without it, the ledger and view counters live in
    /// process memory and the remaining repositories are fixtures.
    pub database_url: Option<String>,
    /// Redis URL for rate-limit counters; in-process counters otherwise.
    pub redis_url: Option<String>,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: Option<String>,
    pub push_gateway_url: Option<String>,
    pub identity_url: Option<String>,
    pub identity_api_key: Option<String>,
    /// Bearer secret for `POST /api/v1/cron/trending`.
    pub cron_secret: Option<String>,
    pub session_key_file: Option<PathBuf>,
    #[ortho_config(default = true)]
    pub session_cookie_secure: bool,
    /// Allow a generated session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Honour `Forwarded` / `X-Forwarded-For` for client addresses.
    #[ortho_config(default = false)]
    pub trust_forwarded_headers: bool,
    pub outbound_timeout_secs: Option<u64>,
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|source| SettingsError::InvalidUrl { name, source })
}

impl ServerSettings {
    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let ip: IpAddr = host.parse().map_err(|source| SettingsError::InvalidHost {
            value: host.to_owned(),
            source,
        })?;
        Ok(SocketAddr::new(ip, self.port.unwrap_or(DEFAULT_PORT)))
    }

    /// Per-request timeout for outbound HTTP and pool checkouts.
    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(
            self.outbound_timeout_secs
                .unwrap_or(DEFAULT_OUTBOUND_TIMEOUT_SECS)
                .max(1),
        )
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Email provider details, when an API URL is configured.
    pub fn email_provider(&self) -> Result<Option<EmailProviderConfig>, SettingsError> {
        let Some(raw_url) = self.email_api_url.as_deref() else {
            return Ok(None);
        };
        let api_key = self.email_api_key.clone().ok_or(SettingsError::Incomplete {
            name: "email_api_url",
            missing: "email_api_key",
        })?;
        let from = self.email_from.clone().ok_or(SettingsError::Incomplete {
            name: "email_api_url",
            missing: "email_from",
        })?;
        Ok(Some(EmailProviderConfig {
            api_url: parse_url("email_api_url", raw_url)?,
            api_key,
            from,
        }))
    }

    pub fn push_gateway_url(&self) -> Result<Option<Url>, SettingsError> {
        self.push_gateway_url
            .as_deref()
            .map(|raw| parse_url("push_gateway_url", raw))
            .transpose()
    }

    /// Identity provider details, when a base URL is configured.
    pub fn identity_provider(&self) -> Result<Option<IdentityProviderConfig>, SettingsError> {
        let Some(raw_url) = self.identity_url.as_deref() else {
            return Ok(None);
        };
        let api_key = self
            .identity_api_key
            .clone()
            .ok_or(SettingsError::Incomplete {
                name: "identity_url",
                missing: "identity_api_key",
            })?;
        Ok(Some(IdentityProviderConfig {
            base_url: parse_url("identity_url", raw_url)?,
            api_key,
        }))
    }
}
