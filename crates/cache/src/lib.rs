//! # Users API Cache
//!
//! A small key/value cache port modelled on pool + item semantics: callers
//! fetch an item by key, inspect whether it was a hit, set a new value with
//! an expiry and hand the item back to the pool to persist it.
//!
//! - [`MemoryCachePool`]: in-process store with per-entry expiry
//! - [`RedisCachePool`]: shared store backed by a redis connection manager
//! - `test_support::RecordingCachePool`: call-recording double for tests,
//!   built with the `test-support` feature

mod item;
mod memory;
mod redis_pool;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

use async_trait::async_trait;
use thiserror::Error;

pub use item::{validate_key, CacheItem, RESERVED_KEY_CHARACTERS};
pub use memory::MemoryCachePool;
pub use redis_pool::RedisCachePool;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache key {0:?}")]
    InvalidKey(String),
    #[error("cache value could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("cache backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Pool of cache items.
///
/// `get_item` never fails because of a miss; a miss is an item whose
/// [`CacheItem::is_hit`] returns `false`.
#[async_trait]
pub trait CachePool: Send + Sync {
    async fn get_item(&self, key: &str) -> CacheResult<CacheItem>;

    async fn save(&self, item: &CacheItem) -> CacheResult<()>;
}
