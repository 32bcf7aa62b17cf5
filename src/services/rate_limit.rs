//! Fixed-window request counter per client, kept in the shared cache store.
use std::time::Duration;

use crate::services::cache::{CacheClient, CacheResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u64,
    pub window: Duration,
}

#[derive(Clone, Debug)]
pub struct RateLimiter<C: CacheClient> {
    cache: C,
    policy: RateLimitPolicy,
    // Key prefix to avoid collisions with recipe entries in a shared store
    prefix: String,
}

impl<C: CacheClient> RateLimiter<C> {
    pub fn new(cache: C, policy: RateLimitPolicy) -> Self {
        Self::new_with_prefix(cache, policy, "ratelimit")
    }

    pub fn new_with_prefix(cache: C, policy: RateLimitPolicy, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            policy,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, client: &str) -> String {
        format!("{}:{}", self.prefix, client)
    }

    pub fn window(&self) -> Duration {
        self.policy.window
    }

    /// Reserve one upstream call for `client` in the current window.
    ///
    /// The counter is incremented before the call is made, so concurrent
    /// requests from one client cannot all pass a stale check. A rejected
    /// reservation is handed back straight away.
    pub async fn acquire(&self, client: &str) -> CacheResult<bool> {
        let key = self.key(client);
        let used = self.cache.incr_with_ttl(&key, self.policy.window).await?;
        if used <= self.policy.max_requests {
            return Ok(true);
        }

        self.cache.decr(&key).await?;
        Ok(false)
    }

    /// Hand back a reservation whose upstream call did not succeed.
    pub async fn release(&self, client: &str) -> CacheResult<()> {
        self.cache.decr(&self.key(client)).await?;
        Ok(())
    }
}
