//! Cache client interface used by higher-level services (recipe cache, rate limits).
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command/serialization).
///
/// Note:
/// - We keep this independent from `AppError` so callers can decide how to fail
///   (fail-open for recipe lookups, fail-closed for rate limits).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
    #[error("cache value error: {0}")]
    InvalidValue(String),
}

/// A minimal, string-based cache interface.
///
/// - Recipe caching needs `GET` and `SET ... EX`.
/// - Rate limiting needs a counter that expires with its window.
///
/// Implementations must be cheap to clone (typically `Arc<...>` inside).
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    // Returns the cache backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Get UTF-8 string value. Expired entries read as `None`.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    // Set value with TTL, replacing any existing value.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    // Increment an integer counter. The TTL is applied only when the counter
    // is created, so the window is fixed from the first increment.
    //
    // Returns the counter value after the increment.
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> CacheResult<u64>;

    // Decrement an existing counter without touching its TTL. A missing or
    // expired counter stays missing; a counter that reaches zero is removed.
    //
    // Returns the counter value after the decrement.
    async fn decr(&self, key: &str) -> CacheResult<u64>;

    // Delete a key. Returns number of deleted keys.
    async fn del(&self, key: &str) -> CacheResult<u64>;
}

/// Convenience helper to build a TTL from seconds.
pub fn ttl_seconds(seconds: u64) -> Duration {
    Duration::from_secs(seconds)
}
