use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, AppResult};

use super::MemoryStore;

/// Detail records are stable for a day
pub const MOVIE_DETAIL_TTL: Duration = Duration::from_secs(86_400);

/// Assembled recommendation lists are kept for an hour
pub const RECOMMENDATIONS_TTL: Duration = Duration::from_secs(3_600);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    MovieDetail(i64),
    Recommendations(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MovieDetail(id) => write!(f, "movie_detail_{}", id),
            CacheKey::Recommendations(title) => write!(f, "recommendations_{}", title),
        }
    }
}

/// Raw key-value storage with per-entry expiry
///
/// Values are opaque serialized strings; an entry read after its TTL has
/// elapsed must be reported as a miss.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()>;

    fn backend(&self) -> &'static str;
}

/// Typed cache handle shared by every request
///
/// Storage failures never reach callers: a failed read is a miss and a failed
/// write is logged and dropped, so a cache outage only costs provider calls.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// In-process cache, used when no Redis URL is configured
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` on a miss, an expired entry, a storage error or an entry
    /// that no longer deserializes into `T`.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();
        let raw = match self.store.get(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, backend = self.backend(), error = %e, "Cache read failed");
                return None;
            }
        };

        match decode(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Stores a value under `key` for `ttl`
    pub async fn set_in_cache<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let key = key.to_string();
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        if let Err(e) = self.store.set(&key, json, ttl).await {
            tracing::warn!(key = %key, backend = self.backend(), error = %e, "Cache write failed");
        } else {
            tracing::debug!(key = %key, ttl_secs = ttl.as_secs_f64(), "Cached value");
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(raw: &str) -> AppResult<T> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Internal(format!("Cache deserialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovieRecord, Runtime};

    struct FailingStore;

    #[async_trait::async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::Internal("store offline".to_string()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> AppResult<()> {
            Err(AppError::Internal("store offline".to_string()))
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    fn record(id: i64, title: &str) -> MovieRecord {
        MovieRecord {
            id,
            title: title.to_string(),
            poster: "https://via.placeholder.com/500x750?text=No+Poster".to_string(),
            backdrop: None,
            overview: "No overview available".to_string(),
            rating: 6.4,
            release_date: "N/A".to_string(),
            runtime: Runtime::NotAvailable,
            genres: vec![],
            cast: vec![],
            director: "N/A".to_string(),
            similarity: None,
        }
    }

    #[test]
    fn test_cache_key_display_movie_detail() {
        let key = CacheKey::MovieDetail(19995);
        assert_eq!(format!("{}", key), "movie_detail_19995");
    }

    #[test]
    fn test_cache_key_display_recommendations_keeps_title_verbatim() {
        let key = CacheKey::Recommendations("The Dark Knight Rises".to_string());
        assert_eq!(format!("{}", key), "recommendations_The Dark Knight Rises");
    }

    #[tokio::test]
    async fn test_single_record_round_trip() {
        let cache = Cache::in_memory();
        let key = CacheKey::MovieDetail(285);

        cache.set_in_cache(&key, &record(285, "Heat"), MOVIE_DETAIL_TTL).await;

        let cached: Option<MovieRecord> = cache.get_from_cache(&key).await;
        assert_eq!(cached, Some(record(285, "Heat")));
    }

    #[tokio::test]
    async fn test_record_sequence_keeps_order() {
        let cache = Cache::in_memory();
        let key = CacheKey::Recommendations("Avatar".to_string());
        let list = vec![record(3, "Alien"), record(1, "Aliens"), record(2, "Titanic")];

        cache.set_in_cache(&key, &list, RECOMMENDATIONS_TTL).await;

        let cached: Option<Vec<MovieRecord>> = cache.get_from_cache(&key).await;
        assert_eq!(cached, Some(list));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = Cache::in_memory();
        let key = CacheKey::MovieDetail(1);
        let retrieved: Option<MovieRecord> = cache.get_from_cache(&key).await;
        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    async fn test_store_failures_degrade_to_miss() {
        let cache = Cache::new(Arc::new(FailingStore));
        let key = CacheKey::MovieDetail(7);

        cache.set_in_cache(&key, &record(7, "Se7en"), MOVIE_DETAIL_TTL).await;
        let retrieved: Option<MovieRecord> = cache.get_from_cache(&key).await;

        assert_eq!(retrieved, None);
        assert_eq!(cache.backend(), "failing");
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_miss() {
        let cache = Cache::in_memory();
        let key = CacheKey::MovieDetail(9);
        cache.set_in_cache(&key, &vec!["not", "a", "record"], MOVIE_DETAIL_TTL).await;

        let retrieved: Option<MovieRecord> = cache.get_from_cache(&key).await;
        assert_eq!(retrieved, None);
    }
}
