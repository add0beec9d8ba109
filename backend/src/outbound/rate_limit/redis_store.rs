//! Redis-backed fixed-window counters.
//!
//! One Lua script increments the counter, arms the expiry on the first hit
//! and reads the remaining TTL, so the check is atomic across replicas.
//! Keys are stored as `ratelimit:v1:<sha256(key)>`; client addresses never
//! appear in Redis in clear text.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, RunError};
use bb8_redis::redis::{RedisError, Script};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::RateLimitKey;
use crate::domain::ports::{RateLimitStore, RateLimitStoreError, WindowHit};

const KEY_PREFIX: &str = "ratelimit:v1:";

const HIT_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('PTTL', KEYS[1])
if ttl < 0 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
  ttl = tonumber(ARGV[1])
end
return {count, ttl}
";

/// Counter store over a `bb8` Redis pool.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    pool: Pool<RedisConnectionManager>,
    script: Script,
}

impl RedisRateLimitStore {
    /// Connect a pool to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitStoreError::Unavailable`] when the URL is invalid
    /// or the initial connection fails.
    pub async fn connect(redis_url: &str, timeout: Duration) -> Result<Self, RateLimitStoreError> {
        let manager = RedisConnectionManager::new(redis_url).map_err(map_redis_error)?;
        let pool = Pool::builder()
            .connection_timeout(timeout)
            .build(manager)
            .await
            .map_err(map_redis_error)?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: Pool<RedisConnectionManager>) -> Self {
        Self {
            pool,
            script: Script::new(HIT_SCRIPT),
        }
    }
}

/// Namespaced, hashed storage key.
pub(crate) fn storage_key(key: &RateLimitKey) -> String {
    let digest = Sha256::digest(key.as_str().as_bytes());
    format!("{KEY_PREFIX}{}", hex::encode(digest))
}

fn map_redis_error(error: RedisError) -> RateLimitStoreError {
    if error.is_io_error() || error.is_connection_dropped() || error.is_timeout() {
        RateLimitStoreError::unavailable(error.to_string())
    } else {
        RateLimitStoreError::command(error.to_string())
    }
}

fn map_pool_error(error: RunError<RedisError>) -> RateLimitStoreError {
    match error {
        RunError::User(err) => map_redis_error(err),
        RunError::TimedOut => RateLimitStoreError::unavailable("redis pool checkout timed out"),
    }
}

fn window_millis(window: Duration) -> u64 {
    u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(
        &self,
        key: &RateLimitKey,
        window: Duration,
    ) -> Result<WindowHit, RateLimitStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (count, ttl_ms): (i64, i64) = self
            .script
            .key(storage_key(key))
            .arg(window_millis(window))
            .invoke_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;

        debug!(count, ttl_ms, "rate-limit window hit");
        Ok(WindowHit {
            count: u32::try_from(count).unwrap_or(u32::MAX),
            ttl: Duration::from_millis(u64::try_from(ttl_ms).unwrap_or_default()),
        })
    }
}
