//! Local decoding of compact bearer tokens.
//!
//! Only the claims segment is read, for expiration bookkeeping. Nothing here
//! verifies a signature: a token is trusted because it came from the auth
//! service, not because it decodes.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Opaque bearer token as issued by the auth service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for AccessToken {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Claims carried in the token's second segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Expiration, seconds since the epoch.
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ClaimSet {
    /// `exp` as an instant. `None` when it is outside chrono's range.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Check if the token is expired or expires within `buffer_secs`.
    #[must_use]
    pub fn is_near_expiry(&self, buffer_secs: i64) -> bool {
        let threshold = Utc::now() + TimeDelta::seconds(buffer_secs);
        threshold.timestamp() >= self.exp
    }
}

/// Decode the claims segment of `token`.
///
/// The payload is base64url; it is mapped onto the standard alphabet and
/// re-padded before decoding, so both padded and unpadded encoders work.
///
/// # Errors
///
/// Returns `AuthError::MalformedToken` if the token does not have three
/// dot-separated segments, the payload is not base64, or the decoded bytes
/// are not a JSON claim set with an integer `exp`.
pub fn decode(token: &AccessToken) -> Result<ClaimSet, AuthError> {
    let segments: Vec<&str> = token.as_str().split('.').collect();
    if segments.len() != 3 || segments[1].is_empty() {
        return Err(AuthError::MalformedToken(format!(
            "expected 3 dot-separated segments, found {}",
            segments.len()
        )));
    }

    let payload = STANDARD
        .decode(to_standard_alphabet(segments[1]))
        .map_err(|e| AuthError::MalformedToken(format!("base64 decode failed: {e}")))?;

    serde_json::from_slice(&payload)
        .map_err(|e| AuthError::MalformedToken(format!("claims JSON parse failed: {e}")))
}

/// True iff `token` decodes and the current time is strictly before `exp`.
#[must_use]
pub fn is_valid(token: &AccessToken) -> bool {
    is_valid_at(token, Utc::now())
}

#[must_use]
pub fn is_valid_at(token: &AccessToken, now: DateTime<Utc>) -> bool {
    decode(token).is_ok_and(|claims| !claims.is_expired_at(now))
}

/// The instant named by `exp`, or `None` if the token does not decode.
#[must_use]
pub fn expiration_instant(token: &AccessToken) -> Option<DateTime<Utc>> {
    decode(token).ok().and_then(|claims| claims.expires_at())
}

fn to_standard_alphabet(segment: &str) -> String {
    let mut normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let rem = normalized.len() % 4;
    if rem != 0 {
        normalized.push_str(&"=".repeat(4 - rem));
    }
    normalized
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::test_support::token_with_exp;

    fn token_with_payload(payload: &str) -> AccessToken {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload);
        AccessToken::new(format!("{header}.{payload}.c2ln"))
    }

    #[test]
    fn decodes_standard_claims() {
        let token = token_with_payload(
            r#"{"sub":"u-1","username":"alice","iat":1700000000,"exp":1700003600,"role":"admin"}"#,
        );
        let claims = decode(&token).expect("decode");
        assert_eq!(claims.exp, 1_700_003_600);
        assert_eq!(claims.sub.as_deref(), Some("u-1"));
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.iat, Some(1_700_000_000));
        assert_eq!(claims.extra["role"], "admin");
    }

    #[test]
    fn url_safe_characters_are_normalized() {
        // Any aligned run of "???" encodes to "Pz8_" in base64url.
        let token = token_with_payload(r#"{"exp":4102444800,"note":"??????"}"#);
        assert!(token.as_str().split('.').nth(1).unwrap().contains('_'));
        let claims = decode(&token).expect("decode");
        assert_eq!(claims.extra["note"], "??????");
    }

    #[test]
    fn padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":10}"#);
        let token = AccessToken::new(format!("{header}.{payload}.sig"));
        assert_eq!(decode(&token).expect("decode").exp, 10);
    }

    #[rstest]
    #[case::single_segment("not-a-token")]
    #[case::two_segments("a.b")]
    #[case::empty_payload("a..c")]
    #[case::four_segments("a.b.c.d")]
    #[case::bad_base64("header.!!!invalid!!!.sig")]
    fn structurally_malformed_tokens_fail(#[case] raw: &str) {
        let token = AccessToken::new(raw);
        assert!(matches!(decode(&token), Err(AuthError::MalformedToken(_))));
        assert!(!is_valid(&token));
        assert!(expiration_instant(&token).is_none());
    }

    #[test]
    fn non_json_payload_fails() {
        let token = token_with_payload("definitely not json");
        let err = decode(&token).unwrap_err();
        assert!(err.to_string().contains("claims JSON parse failed"));
        assert!(!is_valid(&token));
    }

    #[test]
    fn missing_exp_fails() {
        let token = token_with_payload(r#"{"sub":"u-1"}"#);
        assert!(decode(&token).is_err());
        assert!(!is_valid(&token));
    }

    #[test]
    fn future_exp_is_valid() {
        let token = token_with_exp(Utc::now().timestamp() + 3600);
        assert!(is_valid(&token));
    }

    #[test]
    fn past_exp_is_invalid() {
        let token = token_with_exp(Utc::now().timestamp() - 1);
        assert!(!is_valid(&token));
    }

    #[test]
    fn validity_boundary_is_strict() {
        let now = Utc::now();
        let token = token_with_exp(now.timestamp());
        assert!(!is_valid_at(&token, now));
        assert!(is_valid_at(&token, now - TimeDelta::seconds(1)));
    }

    #[test]
    fn expiration_instant_matches_exp() {
        let exp = Utc::now().timestamp() + 120;
        let token = token_with_exp(exp);
        let instant = expiration_instant(&token).expect("instant");
        assert_eq!(instant.timestamp(), exp);
    }

    #[test]
    fn near_expiry_uses_buffer() {
        let claims = decode(&token_with_exp(Utc::now().timestamp() + 30)).unwrap();
        assert!(claims.is_near_expiry(60));
        assert!(!claims.is_near_expiry(5));
    }

    #[test]
    fn debug_output_hides_token() {
        let token = token_with_exp(0);
        assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
    }
}
