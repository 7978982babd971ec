//! Client-credentials token acquisition with a dedicated token cache.

use std::{fmt, sync::Arc};

use serde::Deserialize;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;
use users_api_cache::{CacheItem, CachePool};
use users_api_transport::{
    header::{HeaderValue, ACCEPT, CONTENT_TYPE},
    HttpRequest, HttpTransport, TransportError, Url,
};

use crate::error::{FetchError, UsersApiError, UsersApiResult};

pub const TOKEN_CACHE_KEY: &str = "usersApiAccessToken";

/// Seconds shaved off the server-declared lifetime before caching a token.
pub const TOKEN_EXPIRY_MARGIN_SECONDS: i64 = 10;

/// Bearer token for a single logical operation.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn authorize(&self, request: HttpRequest) -> Result<HttpRequest, TransportError> {
        request.bearer_auth(&self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: ExpiresIn,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(i64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Result<i64, FetchError> {
        match self {
            Self::Seconds(seconds) => Ok(*seconds),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| FetchError::TokenLifetime(text.clone())),
        }
    }
}

/// Cache lifetime for a token: the declared `expires_in` minus the margin.
fn token_lifetime(expires_in: &ExpiresIn) -> Result<i64, FetchError> {
    let seconds = expires_in.seconds()?;
    seconds
        .checked_sub(TOKEN_EXPIRY_MARGIN_SECONDS)
        .ok_or_else(|| FetchError::TokenLifetime(seconds.to_string()))
}

pub struct TokenManager {
    token_url: String,
    client_id: String,
    client_secret: String,
    pool: Arc<dyn CachePool>,
    transport: Arc<dyn HttpTransport>,
}

impl TokenManager {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        pool: Arc<dyn CachePool>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            pool,
            transport,
        }
    }

    /// Return the cached token, or run a client-credentials grant and cache
    /// the result for `expires_in - 10` seconds.
    pub async fn ensure_token(&self) -> UsersApiResult<AccessToken> {
        self.resolve_token().await.map_err(|err| {
            error!(error = %err, "couldn't obtain an access token for the users api");
            UsersApiError::AuthenticationFailed
        })
    }

    async fn resolve_token(&self) -> Result<AccessToken, FetchError> {
        let mut item = self.pool.get_item(TOKEN_CACHE_KEY).await?;

        if item.is_hit() {
            match item.get::<String>() {
                Ok(Some(token)) => {
                    debug!("using cached access token");
                    return Ok(AccessToken(token));
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "discarding undecodable cached access token");
                    item = CacheItem::miss(TOKEN_CACHE_KEY);
                }
            }
        }

        let request = self.token_request()?;
        let response = self.transport.send(request).await?.error_for_status()?;
        let body: TokenResponse = response.json()?;
        let lifetime = token_lifetime(&body.expires_in)?;

        item.set(&body.access_token)?.expires_after(lifetime);
        self.pool.save(&item).await?;

        info!(expires_after = lifetime, "obtained users api access token");
        Ok(AccessToken(body.access_token))
    }

    fn token_request(&self) -> Result<HttpRequest, FetchError> {
        let url = Url::parse(&self.token_url)?;
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .finish();

        Ok(HttpRequest::post(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_in_accepts_numbers_and_numeric_strings() {
        let numeric: TokenResponse =
            serde_json::from_str(r#"{"access_token": "a", "expires_in": 3600}"#).unwrap();
        let text: TokenResponse =
            serde_json::from_str(r#"{"access_token": "a", "expires_in": " 60 "}"#).unwrap();

        assert_eq!(numeric.expires_in.seconds().unwrap(), 3600);
        assert_eq!(text.expires_in.seconds().unwrap(), 60);
    }

    #[test]
    fn expires_in_rejects_non_numeric_text() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "a", "expires_in": "soon"}"#).unwrap();

        assert!(matches!(
            response.expires_in.seconds(),
            Err(FetchError::TokenLifetime(value)) if value == "soon"
        ));
    }

    #[test]
    fn token_lifetime_subtracts_margin_without_overflow() {
        assert_eq!(token_lifetime(&ExpiresIn::Seconds(60)).unwrap(), 50);
        assert_eq!(
            token_lifetime(&ExpiresIn::Seconds(i64::MAX)).unwrap(),
            i64::MAX - 10
        );
        assert!(matches!(
            token_lifetime(&ExpiresIn::Seconds(i64::MIN)),
            Err(FetchError::TokenLifetime(value)) if value == i64::MIN.to_string()
        ));
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken("secret-token".to_string());
        assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
    }
}
