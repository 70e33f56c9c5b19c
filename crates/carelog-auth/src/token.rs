use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AuthError;

/// Access token issued by the identity store.
///
/// `expires_at` is `None` when the backend did not report an expiry and the
/// access token is not a decodable JWT.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    /// Subject (account) id the token was issued for.
    pub subject_id: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        subject_id: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            subject_id: subject_id.into(),
            expires_at,
        }
    }

    /// Build a token from a raw JWT, reading `sub` and `exp` from its payload.
    ///
    /// Does NOT verify the signature; the backend does that on every request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if the JWT is malformed or has no
    /// `sub` claim.
    pub fn from_jwt(jwt: &str) -> Result<Self, AuthError> {
        let payload = decode_payload(jwt)?;
        let subject_id = payload["sub"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::TokenStoreError("missing sub claim".into()))?;
        let expires_at = payload["exp"]
            .as_i64()
            .and_then(|exp| DateTime::from_timestamp(exp, 0));
        Ok(Self::new(jwt, subject_id, expires_at))
    }

    /// Check if the token is expired or expires within `buffer_secs`.
    #[must_use]
    pub fn is_near_expiry(&self, buffer_secs: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            let threshold = Utc::now() + chrono::TimeDelta::seconds(buffer_secs);
            expires_at <= threshold
        })
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("subject_id", &self.subject_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Decode a JWT `exp` claim without signature validation.
///
/// # Errors
///
/// Returns `AuthError::TokenStoreError` if the JWT format is invalid or the
/// `exp` claim is missing or cannot be parsed.
pub fn decode_expiry(jwt: &str) -> Result<DateTime<Utc>, AuthError> {
    let payload = decode_payload(jwt)?;
    let exp = payload["exp"]
        .as_i64()
        .ok_or_else(|| AuthError::TokenStoreError("missing exp claim".into()))?;
    DateTime::from_timestamp(exp, 0)
        .ok_or_else(|| AuthError::TokenStoreError("invalid exp timestamp".into()))
}

fn decode_payload(jwt: &str) -> Result<serde_json::Value, AuthError> {
    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::TokenStoreError("invalid JWT format".into()));
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| AuthError::TokenStoreError(format!("base64 decode failed: {e}")))?;
    serde_json::from_slice(&payload)
        .map_err(|e| AuthError::TokenStoreError(format!("JSON parse failed: {e}")))
}
