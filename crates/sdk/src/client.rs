use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, warn};
use users_api_cache::{CacheItem, CachePool};
use users_api_config::{ApiConfig, CacheConfig, SdkConfig};
use users_api_transport::{
    header::{HeaderValue, ACCEPT},
    HttpRequest, HttpResponse, HttpTransport, Url,
};

use crate::{
    auth::TokenManager,
    entities::{Identifiable, Subsidiary, User},
    error::{FetchError, UsersApiError, UsersApiResult},
    mapper,
};

pub const USERS_CACHE_KEY: &str = "usersApiUsers";
pub const SUBSIDIARIES_CACHE_KEY: &str = "usersApiSubsidiaries";

const USERS_PATH: &str = "users";
const SUBSIDIARIES_PATH: &str = "subsidiaries";

pub fn user_cache_key(id: &str) -> String {
    format!("usersApiUser_{id}")
}

pub fn subsidiaries_cache_key(user_id: Option<&str>) -> String {
    match user_id {
        Some(id) => format!("{SUBSIDIARIES_CACHE_KEY}_{id}"),
        None => SUBSIDIARIES_CACHE_KEY.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl From<&ApiConfig> for ApiSettings {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }
}

/// Lifetimes, in seconds, of the entity cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub users_ttl: i64,
    pub subsidiaries_ttl: i64,
    pub user_subsidiaries_ttl: i64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            users_ttl: 600,
            subsidiaries_ttl: 86_400,
            user_subsidiaries_ttl: 600,
        }
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            users_ttl: config.users_ttl_seconds,
            subsidiaries_ttl: config.subsidiaries_ttl_seconds,
            user_subsidiaries_ttl: config.user_subsidiaries_ttl_seconds,
        }
    }
}

enum Lookup<T> {
    Hit(T),
    Miss(CacheItem),
}

/// Cache-aside client for the Users API.
///
/// Every read checks the entity pool first. Only on a miss (or a forced
/// refresh) does it obtain a token, call the API and write the mapped result
/// back to the pool.
pub struct UsersApiClient {
    base_url: String,
    auth: TokenManager,
    entity_pool: Arc<dyn CachePool>,
    transport: Arc<dyn HttpTransport>,
    policy: CachePolicy,
}

impl UsersApiClient {
    pub fn new(
        settings: ApiSettings,
        policy: CachePolicy,
        token_pool: Arc<dyn CachePool>,
        entity_pool: Arc<dyn CachePool>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let auth = TokenManager::new(
            settings.token_url,
            settings.client_id,
            settings.client_secret,
            token_pool,
            transport.clone(),
        );

        Self {
            base_url: settings.base_url,
            auth,
            entity_pool,
            transport,
            policy,
        }
    }

    pub fn from_config(
        config: &SdkConfig,
        token_pool: Arc<dyn CachePool>,
        entity_pool: Arc<dyn CachePool>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::new(
            ApiSettings::from(&config.api),
            CachePolicy::from(&config.cache),
            token_pool,
            entity_pool,
            transport,
        )
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.auth
    }

    pub async fn get_users(&self, force_refresh: bool) -> UsersApiResult<Vec<User>> {
        self.load_users(force_refresh).await.map_err(|err| {
            error!(error = %err, "couldn't retrieve the list of users");
            UsersApiError::UsersRetrievalFailed
        })
    }

    pub async fn get_user(&self, id: &str, force_refresh: bool) -> UsersApiResult<User> {
        self.load_user(id, force_refresh).await.map_err(|err| {
            error!(user = id, error = %err, "couldn't retrieve user");
            UsersApiError::UserRetrievalFailed { id: id.to_owned() }
        })
    }

    /// Subsidiaries, optionally restricted to those of `user`. Filtered lists
    /// are cached per user with the shorter user TTL.
    pub async fn get_subsidiaries(
        &self,
        force_refresh: bool,
        user: Option<&dyn Identifiable>,
    ) -> UsersApiResult<Vec<Subsidiary>> {
        let user_id = user.map(|user| user.id().to_owned());

        self.load_subsidiaries(force_refresh, user_id.as_deref())
            .await
            .map_err(|err| {
                error!(user = ?user_id, error = %err, "couldn't retrieve the list of subsidiaries");
                UsersApiError::SubsidiariesRetrievalFailed
            })
    }

    async fn load_users(&self, force_refresh: bool) -> Result<Vec<User>, FetchError> {
        let item = match self.lookup(USERS_CACHE_KEY, force_refresh).await? {
            Lookup::Hit(users) => return Ok(users),
            Lookup::Miss(item) => item,
        };

        let response = self.fetch(self.endpoint(USERS_PATH)?).await?;
        let users = mapper::parse_users(&response.body)?;

        self.store(item, &users, self.policy.users_ttl).await?;
        info!(count = users.len(), "users cache refreshed");
        Ok(users)
    }

    async fn load_user(&self, id: &str, force_refresh: bool) -> Result<User, FetchError> {
        let item = match self.lookup(&user_cache_key(id), force_refresh).await? {
            Lookup::Hit(user) => return Ok(user),
            Lookup::Miss(item) => item,
        };

        let mut url = self.endpoint(USERS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| FetchError::BaseUrl(self.base_url.clone()))?
            .push(id);

        let response = self.fetch(url).await?;
        let user = mapper::parse_user(&response.body)?;

        self.store(item, &user, self.policy.users_ttl).await?;
        debug!(user = id, "user cache refreshed");
        Ok(user)
    }

    async fn load_subsidiaries(
        &self,
        force_refresh: bool,
        user_id: Option<&str>,
    ) -> Result<Vec<Subsidiary>, FetchError> {
        let key = subsidiaries_cache_key(user_id);
        let ttl = match user_id {
            Some(_) => self.policy.user_subsidiaries_ttl,
            None => self.policy.subsidiaries_ttl,
        };

        let item = match self.lookup(&key, force_refresh).await? {
            Lookup::Hit(subsidiaries) => return Ok(subsidiaries),
            Lookup::Miss(item) => item,
        };

        let mut url = self.endpoint(SUBSIDIARIES_PATH)?;
        if let Some(id) = user_id {
            url.query_pairs_mut().append_pair("user", id);
        }

        let response = self.fetch(url).await?;
        let subsidiaries = mapper::parse_subsidiaries(&response.body)?;

        self.store(item, &subsidiaries, ttl).await?;
        info!(count = subsidiaries.len(), user = ?user_id, "subsidiaries cache refreshed");
        Ok(subsidiaries)
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        key: &str,
        force_refresh: bool,
    ) -> Result<Lookup<T>, FetchError> {
        if force_refresh {
            debug!(key, "forced refresh, skipping cache lookup");
            return Ok(Lookup::Miss(CacheItem::miss(key)));
        }

        let item = self.entity_pool.get_item(key).await?;
        if !item.is_hit() {
            debug!(key, "cache miss");
            return Ok(Lookup::Miss(item));
        }

        match item.get::<T>() {
            Ok(Some(value)) => {
                debug!(key, "cache hit");
                Ok(Lookup::Hit(value))
            }
            Ok(None) => Ok(Lookup::Miss(item)),
            Err(err) => {
                warn!(key, error = %err, "discarding undecodable cache entry");
                Ok(Lookup::Miss(CacheItem::miss(key)))
            }
        }
    }

    async fn store<T: Serialize + ?Sized + Sync>(
        &self,
        mut item: CacheItem,
        value: &T,
        ttl: i64,
    ) -> Result<(), FetchError> {
        item.set(value)?.expires_after(ttl);
        self.entity_pool.save(&item).await?;
        debug!(key = item.key(), ttl, "cache entry written");
        Ok(())
    }

    async fn fetch(&self, url: Url) -> Result<HttpResponse, FetchError> {
        let token = self.auth.ensure_token().await?;

        let request = token.authorize(
            HttpRequest::get(url).header(ACCEPT, HeaderValue::from_static("application/json")),
        )?;

        Ok(self.transport.send(request).await?.error_for_status()?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        Ok(Url::parse(&url)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_follow_naming_scheme() {
        assert_eq!(USERS_CACHE_KEY, "usersApiUsers");
        assert_eq!(
            user_cache_key("c84056a1-8d36-46c4-ae15-e3cb3db18ed2"),
            "usersApiUser_c84056a1-8d36-46c4-ae15-e3cb3db18ed2"
        );
        assert_eq!(subsidiaries_cache_key(None), "usersApiSubsidiaries");
        assert_eq!(
            subsidiaries_cache_key(Some("88e1260c")),
            "usersApiSubsidiaries_88e1260c"
        );
    }

    #[test]
    fn cache_policy_defaults() {
        let policy = CachePolicy::default();
        assert_eq!(policy.users_ttl, 600);
        assert_eq!(policy.subsidiaries_ttl, 86_400);
        assert_eq!(policy.user_subsidiaries_ttl, 600);
    }

    #[test]
    fn cache_policy_follows_configuration() {
        let config = CacheConfig {
            users_ttl_seconds: 60,
            subsidiaries_ttl_seconds: 3_600,
            user_subsidiaries_ttl_seconds: 120,
            ..CacheConfig::default()
        };

        assert_eq!(
            CachePolicy::from(&config),
            CachePolicy {
                users_ttl: 60,
                subsidiaries_ttl: 3_600,
                user_subsidiaries_ttl: 120,
            }
        );
    }
}
