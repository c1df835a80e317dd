//! In-process cache store.
//!
//! Entries live in a [`DashMap`] so concurrent requests can read and write
//! different keys without a global lock. Expiry is passive: nothing sweeps the
//! map, an expired entry is dropped by the read that finds it.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::AppResult;

use super::CacheStore;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until they are read
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        // Guard must be released before `remove` touches the same shard.
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            // A concurrent `set` may have refreshed the key in between.
            self.entries
                .remove_if(key, |_, entry| entry.is_expired(Instant::now()));
            tracing::trace!(key = %key, "Evicted expired cache entry");
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
