//! Paired identity + access token, persisted together with the renewal cookie
//! that can exchange them for a fresh pair.
//!
//! All keys are written and removed in one storage call, so a stored token
//! always belongs to the stored identity.

use std::sync::Arc;

use desk_core::Identity;

use crate::codec::{self, AccessToken};
use crate::error::AuthError;
use crate::storage::SessionStorage;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const USER_KEY: &str = "user";
pub const RENEWAL_COOKIE_KEY: &str = "renewalCookie";

/// An authenticated session whose token was valid when it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub token: AccessToken,
}

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Replace the stored identity and token together.
    ///
    /// `renewal_cookie` replaces the stored cookie when `Some`; an empty string
    /// erases it. `None` keeps whatever cookie is stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the identity cannot be serialized or the
    /// medium rejects the write.
    pub fn put(
        &self,
        identity: &Identity,
        token: &AccessToken,
        renewal_cookie: Option<&str>,
    ) -> Result<(), AuthError> {
        let user = serde_json::to_string(identity)
            .map_err(|e| AuthError::Storage(format!("serialize identity: {e}")))?;
        let mut entries = vec![(ACCESS_TOKEN_KEY, token.as_str()), (USER_KEY, user.as_str())];
        if let Some(cookie) = renewal_cookie {
            entries.push((RENEWAL_COOKIE_KEY, cookie));
        }
        self.storage.write(&entries)
    }

    /// The stored pair, only while its token is valid.
    pub fn get(&self) -> Option<Session> {
        let token = self.access_token()?;
        let identity = self.identity()?;
        Some(Session { identity, token })
    }

    /// The stored identity regardless of token validity.
    ///
    /// For display only; do not use it to decide whether a request can be signed.
    pub fn identity(&self) -> Option<Identity> {
        let raw = self.read(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(error) => {
                tracing::warn!(%error, "stored identity is unreadable; treating as absent");
                None
            }
        }
    }

    /// The stored token, only if it is currently valid.
    pub fn access_token(&self) -> Option<AccessToken> {
        self.raw_token().filter(codec::is_valid)
    }

    /// The stored token whether or not it has expired.
    pub fn raw_token(&self) -> Option<AccessToken> {
        self.read(ACCESS_TOKEN_KEY)
            .filter(|raw| !raw.is_empty())
            .map(AccessToken::new)
    }

    /// The renewal cookie of the stored session, expired token or not.
    pub fn renewal_cookie(&self) -> Option<String> {
        self.read(RENEWAL_COOKIE_KEY).filter(|raw| !raw.is_empty())
    }

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the medium rejects the removal.
    pub fn clear(&self) -> Result<(), AuthError> {
        self.storage
            .remove(&[ACCESS_TOKEN_KEY, USER_KEY, RENEWAL_COOKIE_KEY])
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.read(key) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, key, "session storage read failed; treating as absent");
                None
            }
        }
    }
}
