use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::error::AppResult;

use super::CacheStore;

/// Creates a Redis-backed cache store
///
/// Uses a `ConnectionManager` so a single multiplexed connection is shared
/// and transparently re-established after Redis restarts.
pub async fn create_redis_store(redis_url: &str) -> anyhow::Result<RedisStore> {
    let client = Client::open(redis_url)?;
    let conn = ConnectionManager::new(client).await?;
    Ok(RedisStore { conn })
}

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

/// Redis expiry has whole-second granularity, so partial seconds round up.
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait::async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = conn.get(key).await?;
        Ok(cached)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_seconds(ttl)).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_rounds_up_to_whole_seconds() {
        assert_eq!(ttl_seconds(Duration::from_secs(3600)), 3600);
        assert_eq!(ttl_seconds(Duration::from_millis(1100)), 2);
        assert_eq!(ttl_seconds(Duration::from_millis(10)), 1);
        assert_eq!(ttl_seconds(Duration::ZERO), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        assert!(create_redis_store("not-a-redis-url").await.is_err());
    }
}
