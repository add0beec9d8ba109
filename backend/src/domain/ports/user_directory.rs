//! Port for resolving user contact details.

use async_trait::async_trait;

use crate::domain::{UserContact, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } =>
            "user directory connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } =>
            "user directory query failed: {message}",
    }
}

/// Lookup contract for display names and addresses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Contact details for `user_id`, or `None` for unknown users.
    async fn find_contact(&self, user_id: &UserId)
    -> Result<Option<UserContact>, UserDirectoryError>;
}

/// Fixture directory that knows nobody.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserDirectory;

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn find_contact(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<UserContact>, UserDirectoryError> {
        Ok(None)
    }
}
