//! # Users API SDK
//!
//! Cached client for the Users API. Users and subsidiaries are read through a
//! cache-aside path; the bearer token needed for the API is obtained with an
//! OAuth2 client-credentials grant and cached in its own pool.
//!
//! ## Architecture
//!
//! - **Client**: cache-aside orchestration ([`UsersApiClient`])
//! - **Auth**: token acquisition and caching ([`TokenManager`])
//! - **Mapper**: JSON payloads to entities
//! - **Entities**: [`User`], [`Subsidiary`], [`UserIdentity`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use users_api_cache::MemoryCachePool;
//! use users_api_sdk::{ApiSettings, CachePolicy, UsersApiClient};
//! use users_api_transport::ReqwestTransport;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = UsersApiClient::new(
//!     ApiSettings {
//!         base_url: "https://api.domain.com".into(),
//!         token_url: "https://api.domain.com/token".into(),
//!         client_id: "client-id".into(),
//!         client_secret: "client-secret".into(),
//!     },
//!     CachePolicy::default(),
//!     Arc::new(MemoryCachePool::new()),
//!     Arc::new(MemoryCachePool::new()),
//!     Arc::new(ReqwestTransport::with_timeout(Duration::from_secs(30), "users-api-sdk")?),
//! );
//!
//! let users = client.get_users(false).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod entities;
pub mod error;
pub mod mapper;

pub use auth::{AccessToken, TokenManager, TOKEN_CACHE_KEY, TOKEN_EXPIRY_MARGIN_SECONDS};
pub use client::{
    subsidiaries_cache_key, user_cache_key, ApiSettings, CachePolicy, UsersApiClient,
    SUBSIDIARIES_CACHE_KEY, USERS_CACHE_KEY,
};
pub use entities::{Identifiable, Subsidiary, User, UserIdentity};
pub use error::{UsersApiError, UsersApiResult};
