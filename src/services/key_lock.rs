//! Per-key async mutexes, so at most one upstream call runs per cache key.
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slot = Arc<Mutex<()>>;

#[derive(Clone, Debug, Default)]
pub struct KeyedLocks {
    slots: Arc<DashMap<String, Slot>>,
}

/// Held while the owning request works on `key`. Dropping it releases the key
/// and removes the slot once nobody else holds or awaits it.
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    slots: Arc<DashMap<String, Slot>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> KeyGuard {
        // Clone out of the map before awaiting so no shard lock is held across the await.
        let slot = self.slots.entry(key.to_string()).or_default().clone();
        let guard = slot.lock_owned().await;

        KeyGuard {
            key: key.to_string(),
            slots: Arc::clone(&self.slots),
            guard: Some(guard),
        }
    }

    /// Number of keys currently locked or awaited.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release the mutex first so its Arc no longer counts.
        self.guard.take();
        // Only the map's own reference left: nobody is waiting on this key.
        self.slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}
