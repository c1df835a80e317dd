pub mod cache;
pub mod memory;
pub mod redis_store;

pub use cache::{Cache, CacheKey, CacheStore};
pub use memory::MemoryStore;
pub use redis_store::{create_redis_store, RedisStore};
