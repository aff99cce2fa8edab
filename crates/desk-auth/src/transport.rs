//! Auth service calls.
//!
//! [`AuthTransport`] is what the session manager needs from the network;
//! [`HttpTransport`] talks to the AppDesk JSON API with `reqwest`. The refresh
//! endpoint authenticates with a renewal cookie the server sets on login. The
//! transport keeps no cookie jar: the cookie travels in [`TokenGrant`] and is
//! persisted with the session, so a later process can still refresh.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use desk_core::Identity;
use serde::{Deserialize, Serialize};

use crate::codec::AccessToken;
use crate::error::AuthError;

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful answer of login, register, and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    #[serde(rename = "user", alias = "identity")]
    pub identity: Identity,
    #[serde(rename = "accessToken")]
    pub access_token: AccessToken,
    /// `name=value` pairs from the response's `Set-Cookie` headers.
    #[serde(skip)]
    pub renewal_cookie: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub trait AuthTransport: Send + Sync + 'static {
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<TokenGrant, AuthError>> + Send;

    fn register(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<TokenGrant, AuthError>> + Send;

    /// Exchange the renewal cookie from an earlier grant for a fresh grant.
    fn refresh(
        &self,
        renewal_cookie: Option<&str>,
    ) -> impl Future<Output = Result<TokenGrant, AuthError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns `AuthError::Network` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Network(format!("build http client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying client, so other API calls share its connection pool.
    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn post_credentials(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<TokenGrant, AuthError> {
        let action = path.trim_start_matches('/');
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(credentials)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("{action}: {e}")))?;
        token_response(resp, action).await
    }
}

impl AuthTransport for HttpTransport {
    async fn login(&self, credentials: &Credentials) -> Result<TokenGrant, AuthError> {
        self.post_credentials("/login", credentials).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<TokenGrant, AuthError> {
        self.post_credentials("/register", credentials).await
    }

    async fn refresh(&self, renewal_cookie: Option<&str>) -> Result<TokenGrant, AuthError> {
        let mut request = self.client.get(format!("{}/refresh", self.base_url));
        match renewal_cookie {
            Some(cookie) => request = request.header(reqwest::header::COOKIE, cookie),
            None => tracing::debug!("refreshing without a renewal cookie"),
        }
        let resp = request
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("refresh: {e}")))?;
        token_response(resp, "refresh").await
    }
}

/// Only HTTP 200 counts as a grant; anything else is a rejection whose
/// message comes from the body when the server supplied one.
async fn token_response(resp: reqwest::Response, action: &str) -> Result<TokenGrant, AuthError> {
    let status = resp.status();
    if status == reqwest::StatusCode::OK {
        let renewal_cookie = cookie_pairs(resp.headers());
        let mut grant = resp
            .json::<TokenGrant>()
            .await
            .map_err(|e| AuthError::Network(format!("{action}: unreadable response: {e}")))?;
        grant.renewal_cookie = renewal_cookie;
        return Ok(grant);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| format!("{action} failed with HTTP {status}"), str::to_string)
        });

    Err(AuthError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Join the `name=value` part of every `Set-Cookie` header into one `Cookie`
/// value. Attributes (`Path`, `Max-Age`, ...) are dropped.
fn cookie_pairs(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(|raw| raw.split_once(';').map_or(raw, |(pair, _)| pair).trim())
        .filter(|pair| pair.contains('='))
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
