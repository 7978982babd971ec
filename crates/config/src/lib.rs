use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "users-api.toml",
    "users-api.json",
    "config/users-api.toml",
    "config/users-api.json",
    "../users-api.toml",
    "../config/users-api.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SdkConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
}

impl SdkConfig {
    /// Reject configurations that cannot possibly authenticate against the API.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.trim().is_empty() {
            bail!("api.base_url must be set");
        }
        if self.api.token_url.trim().is_empty() {
            bail!("api.token_url must be set");
        }
        if self.api.client_id.is_empty() || self.api.client_secret.is_empty() {
            bail!("api.client_id and api.client_secret must be set");
        }
        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.is_none() {
            bail!("cache.redis_url must be set when the redis backend is selected");
        }
        Ok(())
    }
}

/// Connection settings for the Users API and its token endpoint.
///
/// ```
/// use users_api_config::ApiConfig;
///
/// let api = ApiConfig::default();
/// assert_eq!(api.request_timeout_seconds, 30);
/// assert_eq!(api.user_agent, "users-api-sdk");
/// assert!(api.client_id.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "ApiConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "ApiConfig::default_user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    const fn default_request_timeout() -> u64 {
        30
    }

    fn default_user_agent() -> String {
        "users-api-sdk".to_string()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            request_timeout_seconds: Self::default_request_timeout(),
            user_agent: Self::default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "CacheConfig::default_token_namespace")]
    pub token_namespace: String,
    #[serde(default = "CacheConfig::default_entity_namespace")]
    pub entity_namespace: String,
    #[serde(default = "CacheConfig::default_users_ttl")]
    pub users_ttl_seconds: i64,
    #[serde(default = "CacheConfig::default_subsidiaries_ttl")]
    pub subsidiaries_ttl_seconds: i64,
    #[serde(default = "CacheConfig::default_users_ttl")]
    pub user_subsidiaries_ttl_seconds: i64,
}

impl CacheConfig {
    fn default_token_namespace() -> String {
        "users-api-token".to_string()
    }

    fn default_entity_namespace() -> String {
        "users-api".to_string()
    }

    const fn default_users_ttl() -> i64 {
        600
    }

    const fn default_subsidiaries_ttl() -> i64 {
        86_400
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: None,
            token_namespace: Self::default_token_namespace(),
            entity_namespace: Self::default_entity_namespace(),
            users_ttl_seconds: Self::default_users_ttl(),
            subsidiaries_ttl_seconds: Self::default_subsidiaries_ttl(),
            user_subsidiaries_ttl_seconds: Self::default_users_ttl(),
        }
    }
}

/// Load the SDK configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use users_api_config::load;
///
/// std::env::remove_var("USERS_API_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert_eq!(config.cache.users_ttl_seconds, 600);
/// ```
pub fn load() -> anyhow::Result<SdkConfig> {
    let defaults = SdkConfig::default();

    let timeout = i64::try_from(defaults.api.request_timeout_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("api.base_url", defaults.api.base_url.clone())?
        .set_default("api.token_url", defaults.api.token_url.clone())?
        .set_default("api.client_id", defaults.api.client_id.clone())?
        .set_default("api.client_secret", defaults.api.client_secret.clone())?
        .set_default("api.request_timeout_seconds", timeout)?
        .set_default("api.user_agent", defaults.api.user_agent.clone())?
        .set_default("cache.backend", "memory")?
        .set_default("cache.token_namespace", defaults.cache.token_namespace.clone())?
        .set_default("cache.entity_namespace", defaults.cache.entity_namespace.clone())?
        .set_default("cache.users_ttl_seconds", defaults.cache.users_ttl_seconds)?
        .set_default(
            "cache.subsidiaries_ttl_seconds",
            defaults.cache.subsidiaries_ttl_seconds,
        )?
        .set_default(
            "cache.user_subsidiaries_ttl_seconds",
            defaults.cache.user_subsidiaries_ttl_seconds,
        )?;

    let environment_overrides = config::Environment::with_prefix("USERS_API").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("USERS_API_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via USERS_API_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<SdkConfig>()
        .context("invalid configuration")?;

    debug!(
        base_url = %config.api.base_url,
        token_url = %config.api.token_url,
        backend = ?config.cache.backend,
        "loaded users api configuration"
    );
    Ok(config)
}
