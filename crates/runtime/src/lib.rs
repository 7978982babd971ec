use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tracing::{info, warn};
use users_api_cache::{CachePool, MemoryCachePool, RedisCachePool};
use users_api_config::{CacheBackend, CacheConfig, SdkConfig};
use users_api_sdk::UsersApiClient;
use users_api_transport::ReqwestTransport;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Token and entity pools selected from the cache configuration.
pub struct CachePools {
    pub token: Arc<dyn CachePool>,
    pub entity: Arc<dyn CachePool>,
    pub backend: CacheBackend,
}

impl CachePools {
    /// Connect to the configured backend. Redis failures are logged and the
    /// pools fall back to process memory.
    pub async fn connect(config: &CacheConfig) -> Self {
        match (config.backend, config.redis_url.as_deref()) {
            (CacheBackend::Redis, Some(url)) => match Self::redis(url, config).await {
                Ok(pools) => {
                    info!("redis cache connection established");
                    pools
                }
                Err(error) => {
                    warn!(%error, "failed to connect to redis, falling back to memory cache");
                    Self::memory()
                }
            },
            (CacheBackend::Redis, None) => {
                warn!("redis backend selected without redis_url, falling back to memory cache");
                Self::memory()
            }
            (CacheBackend::Memory, _) => Self::memory(),
        }
    }

    pub fn memory() -> Self {
        Self {
            token: Arc::new(MemoryCachePool::new()),
            entity: Arc::new(MemoryCachePool::new()),
            backend: CacheBackend::Memory,
        }
    }

    async fn redis(url: &str, config: &CacheConfig) -> Result<Self> {
        let token = RedisCachePool::connect(url, config.token_namespace.clone())
            .await
            .context("failed to open token cache")?;
        let entity = RedisCachePool::connect(url, config.entity_namespace.clone())
            .await
            .context("failed to open entity cache")?;

        Ok(Self {
            token: Arc::new(token),
            entity: Arc::new(entity),
            backend: CacheBackend::Redis,
        })
    }
}

#[derive(Clone)]
pub struct SdkServices {
    pub client: Arc<UsersApiClient>,
    pub cache_backend: CacheBackend,
}

impl SdkServices {
    pub async fn initialise(config: &SdkConfig) -> Result<Self> {
        config.validate().context("invalid users api configuration")?;

        let transport = ReqwestTransport::with_timeout(
            Duration::from_secs(config.api.request_timeout_seconds),
            &config.api.user_agent,
        )
        .context("failed to build http client")?;

        let pools = CachePools::connect(&config.cache).await;
        let cache_backend = pools.backend;

        let client = Arc::new(UsersApiClient::from_config(
            config,
            pools.token,
            pools.entity,
            Arc::new(transport),
        ));

        info!(backend = ?cache_backend, base_url = %config.api.base_url, "users api client ready");

        Ok(Self {
            client,
            cache_backend,
        })
    }
}
