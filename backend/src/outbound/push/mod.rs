//! Web push delivery through an HTTP push gateway.
//!
//! The gateway owns VAPID signing and payload encryption; this adapter posts
//! the subscription and payload and maps the gateway's answer. A 404 or 410
//! means the browser endpoint no longer exists.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;

use crate::domain::ports::{PushSender, PushSenderError};
use crate::domain::{PushPayload, PushSubscription};

#[derive(Serialize)]
struct SubscriptionKeys<'a> {
    p256dh: &'a str,
    auth: &'a str,
}

#[derive(Serialize)]
struct PushRequestBody<'a> {
    endpoint: &'a str,
    keys: SubscriptionKeys<'a>,
    payload: &'a PushPayload,
}

/// Push sender posting to the gateway.
pub struct HttpPushGateway {
    client: Client,
    gateway_url: Url,
}

impl HttpPushGateway {
    /// Create a gateway adapter sharing `client`.
    pub fn new(client: Client, gateway_url: Url) -> Self {
        Self {
            client,
            gateway_url,
        }
    }
}

fn map_status(status: StatusCode) -> Result<(), PushSenderError> {
    match status {
        _ if status.is_success() => Ok(()),
        StatusCode::NOT_FOUND | StatusCode::GONE => Err(PushSenderError::gone()),
        _ => Err(PushSenderError::rejected(status.as_u16())),
    }
}

#[async_trait]
impl PushSender for HttpPushGateway {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), PushSenderError> {
        let body = PushRequestBody {
            endpoint: subscription.endpoint.as_str(),
            keys: SubscriptionKeys {
                p256dh: subscription.p256dh.as_str(),
                auth: subscription.auth.as_str(),
            },
            payload,
        };
        let response = self
            .client
            .post(self.gateway_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|err| PushSenderError::transport(err.to_string()))?;
        map_status(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StatusCode::CREATED, None)]
    #[case(StatusCode::NOT_FOUND, Some(PushSenderError::Gone))]
    #[case(StatusCode::GONE, Some(PushSenderError::Gone))]
    #[case(StatusCode::TOO_MANY_REQUESTS, Some(PushSenderError::Rejected { status: 429 }))]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, Some(PushSenderError::Rejected { status: 500 }))]
    fn maps_gateway_statuses(#[case] status: StatusCode, #[case] expected: Option<PushSenderError>) {
        assert_eq!(map_status(status).err(), expected);
    }
}
