//! In-process fixed-window counters.
//!
//! Used when no Redis URL is configured and by tests. Counting happens under
//! a single mutex, so concurrent hits on one key never over-admit; limits are
//! per process, not shared across replicas.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::RateLimitKey;
use crate::domain::ports::{RateLimitStore, RateLimitStoreError, WindowHit};

/// Expired entries are swept once the map grows past this size.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    expires_at: DateTime<Utc>,
    count: u32,
}

/// Mutex-guarded map of counters keyed by rate-limit key.
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRateLimitStore {
    /// Create an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

fn to_chrono(window: Duration) -> Result<chrono::Duration, RateLimitStoreError> {
    chrono::Duration::from_std(window)
        .map_err(|err| RateLimitStoreError::command(format!("invalid window: {err}")))
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(
        &self,
        key: &RateLimitKey,
        window: Duration,
    ) -> Result<WindowHit, RateLimitStoreError> {
        let span = to_chrono(window)?;
        let now = self.clock.utc();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, entry| entry.expires_at > now);
        }

        let entry = windows
            .entry(key.as_str().to_owned())
            .and_modify(|entry| {
                if entry.expires_at <= now {
                    *entry = Window {
                        expires_at: now + span,
                        count: 0,
                    };
                }
            })
            .or_insert(Window {
                expires_at: now + span,
                count: 0,
            });
        entry.count = entry.count.saturating_add(1);

        let ttl = (entry.expires_at - now).to_std().unwrap_or_default();
        Ok(WindowHit {
            count: entry.count,
            ttl,
        })
    }
}
