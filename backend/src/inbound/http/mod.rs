//! HTTP inbound adapter exposing the REST endpoints.
//!
//! Handlers translate JSON into domain requests, call the driving ports held
//! in [`state::HttpState`], and map [`crate::domain::Error`] onto responses.

pub mod auth;
pub mod client_ip;
pub mod coins;
pub mod cron;
pub mod error;
pub mod health;
pub mod itineraries;
pub mod notifications;
pub mod preferences;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
