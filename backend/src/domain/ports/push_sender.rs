//! Port for web push delivery.

use async_trait::async_trait;

use crate::domain::{PushPayload, PushSubscription};

use super::define_port_error;

define_port_error! {
    /// Errors raised by push delivery adapters.
    pub enum PushSenderError {
        /// The endpoint no longer exists (HTTP 404 or 410 from the push
        /// service); the subscription should be removed.
        Gone => "push endpoint is gone",
        /// The push service refused the message.
        Rejected { status: u16 } =>
            "push rejected with status {status}",
        /// The gateway could not be reached or timed out.
        Transport { message: String } =>
            "push transport failed: {message}",
    }
}

/// Delivery contract for push payloads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Deliver `payload` to one subscription. No retries.
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), PushSenderError>;
}

/// Sender used when no gateway is configured; accepts everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePushSender;

#[async_trait]
impl PushSender for FixturePushSender {
    async fn send(
        &self,
        _subscription: &PushSubscription,
        _payload: &PushPayload,
    ) -> Result<(), PushSenderError> {
        Ok(())
    }
}
