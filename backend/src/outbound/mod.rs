//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **rate_limit**: Redis and in-process counter stores
//! - **memory**: in-process ledger and view counters
//! - **email**, **push**, **identity**: reqwest clients for external providers
//!
//! Adapters translate between domain types and wire or row formats. They
//! hold no business rules.

pub mod email;
pub mod http_support;
pub mod identity;
pub mod memory;
pub mod persistence;
pub mod push;
pub mod rate_limit;
