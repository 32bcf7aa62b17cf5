use async_trait::async_trait;
use dashmap::DashMap;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process cache backend.
///
/// Expired entries are evicted lazily, on the next lookup that touches them.
/// Time is read from `tokio::time`, so tests can drive expiry with a paused clock.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, MemoryEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();

        // `remove_if` takes the shard write lock, so a concurrent fresh write
        // is never evicted by mistake.
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
        {
            tracing::trace!(key, "evicted expired cache entry");
            return Ok(None);
        }

        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> CacheResult<u64> {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| MemoryEntry {
                value: "0".to_string(),
                expires_at: now + ttl,
            });

        if entry.is_expired(now) {
            *entry = MemoryEntry {
                value: "0".to_string(),
                expires_at: now + ttl,
            };
        }

        let current: u64 = entry
            .value
            .parse()
            .map_err(|_| CacheError::InvalidValue(format!("{key} is not a counter")))?;
        let next = current + 1;
        entry.value = next.to_string();

        Ok(next)
    }

    async fn decr(&self, key: &str) -> CacheResult<u64> {
        let now = Instant::now();
        let mut result: CacheResult<u64> = Ok(0);

        // Decide removal under the shard lock so a racing increment is never lost.
        self.entries.remove_if_mut(key, |_, entry| {
            if entry.is_expired(now) {
                return true;
            }
            match entry.value.parse::<u64>() {
                Ok(current) => {
                    let next = current.saturating_sub(1);
                    entry.value = next.to_string();
                    result = Ok(next);
                    next == 0
                }
                Err(_) => {
                    result = Err(CacheError::InvalidValue(format!("{key} is not a counter")));
                    false
                }
            }
        });

        result
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        Ok(self.entries.remove(key).map_or(0, |_| 1))
    }
}
