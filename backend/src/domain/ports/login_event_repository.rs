//! Port for the sign-in audit log.

use async_trait::async_trait;

use crate::domain::LoginEvent;

use super::define_port_error;

define_port_error! {
    /// Errors raised by login event adapters.
    pub enum LoginEventRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "login event connection failed: {message}",
        /// Insert failed during execution.
        Query { message: String } =>
            "login event insert failed: {message}",
    }
}

/// Append-only sign-in audit log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginEventRepository: Send + Sync {
    /// Append one sign-in record.
    async fn record(&self, event: &LoginEvent) -> Result<(), LoginEventRepositoryError>;
}

/// Fixture log that discards records.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLoginEventRepository;

#[async_trait]
impl LoginEventRepository for FixtureLoginEventRepository {
    async fn record(&self, _event: &LoginEvent) -> Result<(), LoginEventRepositoryError> {
        Ok(())
    }
}
