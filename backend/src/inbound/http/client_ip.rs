//! Client address extraction for rate limiting and sign-in auditing.
//!
//! By default the TCP peer address is used. Deployments behind a trusted
//! reverse proxy register [`ClientIpSource::Forwarded`] as app data so the
//! `Forwarded` / `X-Forwarded-For` headers are honoured instead; those headers
//! are client-controlled otherwise and must not key a rate limit.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use actix_web::http::header::USER_AGENT;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};

use crate::domain::ClientInfo;

/// Where the client address is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientIpSource {
    /// The socket peer address.
    #[default]
    Peer,
    /// The first hop recorded by a trusted proxy, falling back to the peer.
    Forwarded,
}

/// Caller details extracted from the request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestClient(ClientInfo);

impl RequestClient {
    /// Subject used in rate-limit keys; `unknown` when no address is known.
    pub fn rate_limit_subject(&self) -> String {
        self.0
            .ip_address
            .map_or_else(|| "unknown".to_owned(), |ip| ip.to_string())
    }

    /// Address and user agent for audit records.
    pub fn into_info(self) -> ClientInfo {
        self.0
    }

    fn from_head(req: &HttpRequest) -> Self {
        let source = req.app_data::<ClientIpSource>().copied().unwrap_or_default();
        let ip_address = match source {
            ClientIpSource::Peer => req.peer_addr().map(|addr| addr.ip()),
            ClientIpSource::Forwarded => req
                .connection_info()
                .realip_remote_addr()
                .and_then(parse_ip)
                .or_else(|| req.peer_addr().map(|addr| addr.ip())),
        };
        let user_agent = req
            .headers()
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Self(ClientInfo {
            ip_address,
            user_agent,
        })
    }
}

/// Accepts `1.2.3.4`, `1.2.3.4:80`, `::1`, `[::1]` and `[::1]:80`.
fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
        .or_else(|| {
            raw.strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .and_then(|inner| inner.parse().ok())
        })
}

impl FromRequest for RequestClient {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_head(req)))
    }
}
