//! Cache pool double that records every call made against it.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use crate::{CacheError, CacheItem, CachePool, CacheResult, MemoryCachePool};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCall {
    GetItem(String),
    Save {
        key: String,
        value: Option<String>,
        ttl: Option<i64>,
    },
}

/// Wraps a [`MemoryCachePool`] and keeps a log of `get_item` and `save`
/// calls. Lookups or saves can be switched to fail with a backend error.
#[derive(Debug, Default)]
pub struct RecordingCachePool {
    inner: MemoryCachePool,
    calls: Mutex<Vec<CacheCall>>,
    lookup_failure: Option<String>,
    save_failure: Option<String>,
}

impl RecordingCachePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_lookups(message: impl Into<String>) -> Self {
        Self {
            lookup_failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn failing_saves(message: impl Into<String>) -> Self {
        Self {
            save_failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Store a value without recording the call.
    pub async fn seed<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let mut item = CacheItem::miss(key);
        item.set(value).expect("seed value should serialize");
        self.inner.save(&item).await.expect("seed value should save");
    }

    /// Read a live value without recording the call.
    pub async fn stored<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.inner
            .get_item(key)
            .await
            .ok()
            .and_then(|item| item.get().ok().flatten())
    }

    pub async fn calls(&self) -> Vec<CacheCall> {
        self.calls.lock().await.clone()
    }

    pub async fn lookups(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                CacheCall::GetItem(key) => Some(key.clone()),
                CacheCall::Save { .. } => None,
            })
            .collect()
    }

    /// `(key, ttl)` for every save, in call order.
    pub async fn saves(&self) -> Vec<(String, Option<i64>)> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                CacheCall::Save { key, ttl, .. } => Some((key.clone(), *ttl)),
                CacheCall::GetItem(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl CachePool for RecordingCachePool {
    async fn get_item(&self, key: &str) -> CacheResult<CacheItem> {
        self.calls
            .lock()
            .await
            .push(CacheCall::GetItem(key.to_owned()));

        if let Some(message) = &self.lookup_failure {
            return Err(CacheError::Backend(message.clone()));
        }

        self.inner.get_item(key).await
    }

    async fn save(&self, item: &CacheItem) -> CacheResult<()> {
        self.calls.lock().await.push(CacheCall::Save {
            key: item.key().to_owned(),
            value: item.raw_value().map(str::to_owned),
            ttl: item.ttl(),
        });

        if let Some(message) = &self.save_failure {
            return Err(CacheError::Backend(message.clone()));
        }

        self.inner.save(item).await
    }
}
