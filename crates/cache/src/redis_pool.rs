use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::{debug, info};

use crate::{validate_key, CacheItem, CachePool, CacheResult};

/// Redis-backed cache pool. Keys are stored as `<namespace>:<key>` so the
/// token pool and the entity pool can share one redis database.
#[derive(Clone)]
pub struct RedisCachePool {
    connection: ConnectionManager,
    namespace: String,
}

impl RedisCachePool {
    pub fn new(connection: ConnectionManager, namespace: impl Into<String>) -> Self {
        Self {
            connection,
            namespace: namespace.into(),
        }
    }

    pub async fn connect(url: &str, namespace: impl Into<String>) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        let pool = Self::new(connection, namespace);
        info!(namespace = %pool.namespace, "redis cache pool connected");
        Ok(pool)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn storage_key(&self, key: &str) -> String {
        namespaced_key(&self.namespace, key)
    }
}

fn namespaced_key(namespace: &str, key: &str) -> String {
    format!("{namespace}:{key}")
}

#[async_trait]
impl CachePool for RedisCachePool {
    async fn get_item(&self, key: &str) -> CacheResult<CacheItem> {
        validate_key(key)?;

        let mut connection = self.connection.clone();
        let stored: Option<String> = connection.get(self.storage_key(key)).await?;

        debug!(key, hit = stored.is_some(), "redis cache lookup");
        Ok(match stored {
            Some(value) => CacheItem::hit(key, value),
            None => CacheItem::miss(key),
        })
    }

    async fn save(&self, item: &CacheItem) -> CacheResult<()> {
        validate_key(item.key())?;

        let storage_key = self.storage_key(item.key());
        let mut connection = self.connection.clone();

        match (item.raw_value(), item.ttl()) {
            (Some(value), Some(seconds)) if seconds > 0 => {
                redis::cmd("SET")
                    .arg(&storage_key)
                    .arg(value)
                    .arg("EX")
                    .arg(seconds)
                    .query_async::<_, ()>(&mut connection)
                    .await?;
            }
            (Some(value), None) => {
                connection.set::<_, _, ()>(&storage_key, value).await?;
            }
            _ => {
                connection.del::<_, ()>(&storage_key).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::namespaced_key;

    #[test]
    fn keys_are_prefixed_with_namespace() {
        assert_eq!(
            namespaced_key("users-api", "usersApiUser_42"),
            "users-api:usersApiUser_42"
        );
    }
}
