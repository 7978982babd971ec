use thiserror::Error;
use users_api_cache::CacheError;
use users_api_transport::TransportError;

/// Errors surfaced to SDK callers. Transport, cache and decoding failures
/// are logged and collapsed into one of these kinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsersApiError {
    #[error("Couldn't connect to Users API.")]
    AuthenticationFailed,
    #[error("Couldn't retrieve the list of Users.")]
    UsersRetrievalFailed,
    #[error("Couldn't retrieve the User {id}.")]
    UserRetrievalFailed { id: String },
    #[error("Couldn't retrieve the list of Subsidiaries.")]
    SubsidiariesRetrievalFailed,
}

pub type UsersApiResult<T> = Result<T, UsersApiError>;

/// Internal failure causes, never returned from the public API.
#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("base url {0} cannot carry path segments")]
    BaseUrl(String),
    #[error("invalid token lifetime {0:?}")]
    TokenLifetime(String),
    #[error(transparent)]
    Auth(#[from] UsersApiError),
}
