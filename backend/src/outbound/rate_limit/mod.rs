//! Rate-limit counter stores.
//!
//! - `redis_store`: shared counters for multi-replica deployments.
//! - `memory_store`: per-process counters for development and tests.

mod memory_store;
mod redis_store;

pub use memory_store::InMemoryRateLimitStore;
pub use redis_store::RedisRateLimitStore;
