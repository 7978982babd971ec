use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{validate_key, CacheItem, CachePool, CacheResult};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

/// Expiry instant for a TTL in seconds. Lifetimes beyond chrono's range are
/// clamped to the latest representable instant.
fn expiry(now: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    TimeDelta::try_seconds(seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(if seconds > 0 { DateTime::<Utc>::MAX_UTC } else { now })
}

/// In-process cache pool. Entries without an expiry live for the lifetime of
/// the pool; expired entries are evicted on every save.
#[derive(Debug, Default)]
pub struct MemoryCachePool {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCachePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries that have not expired yet.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| entry.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CachePool for MemoryCachePool {
    async fn get_item(&self, key: &str) -> CacheResult<CacheItem> {
        validate_key(key)?;

        let now = Utc::now();
        let entries = self.entries.read().await;
        let item = match entries.get(key) {
            Some(entry) if entry.is_live(now) => CacheItem::hit(key, entry.value.clone()),
            _ => CacheItem::miss(key),
        };

        debug!(key, hit = item.is_hit(), "memory cache lookup");
        Ok(item)
    }

    async fn save(&self, item: &CacheItem) -> CacheResult<()> {
        validate_key(item.key())?;

        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));

        let Some(value) = item.raw_value() else {
            entries.remove(item.key());
            return Ok(());
        };

        let entry = Entry {
            value: value.to_owned(),
            expires_at: item.ttl().map(|seconds| expiry(now, seconds)),
        };

        if entry.is_live(now) {
            entries.insert(item.key().to_owned(), entry);
        } else {
            entries.remove(item.key());
        }

        Ok(())
    }
}
