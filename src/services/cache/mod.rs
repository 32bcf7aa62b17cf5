pub mod client;
pub mod memory;
pub mod valkey;

use async_trait::async_trait;
use std::time::Duration;

pub use client::{CacheClient, CacheError, CacheResult, ttl_seconds};
pub use memory::MemoryCache;
pub use valkey::ValkeyClient;

/// The cache backend selected at startup.
///
/// `AppState` needs one concrete type, so the two backends are folded into an
/// enum rather than boxed behind a trait object.
#[derive(Clone, Debug)]
pub enum CacheBackend {
    Memory(MemoryCache),
    Valkey(ValkeyClient),
}

impl CacheBackend {
    /// Connect to Valkey when a URL is configured, otherwise keep state in process.
    pub async fn connect(url: Option<&str>) -> CacheResult<Self> {
        match url {
            Some(url) => Ok(Self::Valkey(ValkeyClient::new(url).await?)),
            None => Ok(Self::Memory(MemoryCache::new())),
        }
    }
}

#[async_trait]
impl CacheClient for CacheBackend {
    fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(c) => c.backend_name(),
            Self::Valkey(c) => c.backend_name(),
        }
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            Self::Memory(c) => c.get_string(key).await,
            Self::Valkey(c) => c.get_string(key).await,
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        match self {
            Self::Memory(c) => c.set_with_ttl(key, value, ttl).await,
            Self::Valkey(c) => c.set_with_ttl(key, value, ttl).await,
        }
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> CacheResult<u64> {
        match self {
            Self::Memory(c) => c.incr_with_ttl(key, ttl).await,
            Self::Valkey(c) => c.incr_with_ttl(key, ttl).await,
        }
    }

    async fn decr(&self, key: &str) -> CacheResult<u64> {
        match self {
            Self::Memory(c) => c.decr(key).await,
            Self::Valkey(c) => c.decr(key).await,
        }
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        match self {
            Self::Memory(c) => c.del(key).await,
            Self::Valkey(c) => c.del(key).await,
        }
    }
}
