//! JSON-over-HTTP implementation of both store traits.
//!
//! Endpoints, relative to the configured backend URL (every request carries
//! the `apikey` header):
//!
//! - `POST /auth/token` `{email, password}` → `{access_token, user: {id}, expires_at?}`
//! - `POST /auth/logout` with `Authorization: Bearer <token>`
//! - `GET /users/{id}` → staff record, 404 when absent
//!
//! The issued token is written to the [`TokenCache`] so the next run can
//! restore it.

use std::time::Duration;

use async_trait::async_trait;
use carelog_config::{AuthConfig, BackendConfig};
use carelog_core::UserRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::AuthError;
use crate::store::{IdentityStore, StoreError, UserRecordStore};
use crate::token::{Token, decode_expiry};
use crate::token_store::TokenCache;

const CHANGE_CHANNEL_CAPACITY: usize = 16;

#[derive(Serialize)]
struct TokenRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
    /// Unix seconds.
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    cache: TokenCache,
    changes: broadcast::Sender<Option<Token>>,
}

impl HttpBackend {
    /// Build a backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkUnavailable` if the backend section is
    /// missing or invalid, or the HTTP client cannot be built.
    pub fn new(backend: &BackendConfig, auth: &AuthConfig) -> Result<Self, AuthError> {
        backend
            .validate()
            .map_err(|e| AuthError::NetworkUnavailable(e.to_string()))?;
        Self::with_cache(backend, TokenCache::from_config(auth))
    }

    /// Like [`Self::new`] but with an explicit token cache.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkUnavailable` if the HTTP client cannot be built.
    pub fn with_cache(backend: &BackendConfig, cache: TokenCache) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(backend.timeout_secs))
            .build()
            .map_err(|e| AuthError::NetworkUnavailable(format!("http client: {e}")))?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            client,
            base_url: backend.base_url().to_string(),
            anon_key: backend.anon_key.clone(),
            cache,
            changes,
        })
    }

    #[must_use]
    pub const fn cache(&self) -> &TokenCache {
        &self.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn user_request(&self, subject_id: &str, bearer: Option<&str>) -> reqwest::RequestBuilder {
        let path = format!("/users/{}", urlencoding::encode(subject_id));
        let request = self
            .client
            .get(self.url(&path))
            .header("apikey", &self.anon_key);
        match bearer {
            Some(bearer) => request.bearer_auth(bearer),
            None => request,
        }
    }

    async fn fetch_user(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<UserRecord>, StoreError> {
        let response = request.send().await.map_err(transport_error)?;

        match lookup_status(response.status().as_u16()) {
            Lookup::Found => response
                .json::<UserRecord>()
                .await
                .map(Some)
                .map_err(|e| StoreError::Protocol(format!("user record: {e}"))),
            Lookup::Absent => Ok(None),
            Lookup::Failed(error) => Err(error),
        }
    }
}

#[async_trait]
impl IdentityStore for HttpBackend {
    async fn active_token(&self) -> Result<Option<Token>, StoreError> {
        let Some(token) = self.cache.load() else {
            return Ok(None);
        };
        if token.is_near_expiry(0) {
            tracing::debug!(subject_id = %token.subject_id, "cached token expired; clearing");
            if let Err(error) = self.cache.delete() {
                tracing::warn!(%error, "failed to clear expired token");
            }
            let _ = self.changes.send(None);
            return Ok(None);
        }
        Ok(Some(token))
    }

    async fn exchange_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Token, StoreError> {
        let response = self
            .client
            .post(self.url("/auth/token"))
            .header("apikey", &self.anon_key)
            .json(&TokenRequest {
                email: identifier,
                password: secret,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        if let Some(error) = exchange_status_error(status) {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status, body = %body, "credential exchange refused");
            return Err(error);
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Protocol(format!("token response: {e}")))?;
        let token = token_from_response(body);

        if let Err(error) = self.cache.store(&token) {
            tracing::warn!(%error, "failed to persist session token");
        }
        Ok(token)
    }

    async fn invalidate(&self, token: &Token) -> Result<(), StoreError> {
        if let Err(error) = self.cache.clear_if(token) {
            tracing::warn!(%error, "failed to clear cached token");
        }

        let response = self
            .client
            .post(self.url("/auth/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        // An already-expired or unknown token is as good as revoked.
        if response.status().is_success() || status == 401 || status == 404 {
            return Ok(());
        }
        Err(StoreError::Protocol(format!("logout returned HTTP {status}")))
    }

    async fn reinstate(&self, token: &Token) -> Result<(), StoreError> {
        self.cache
            .store(token)
            .map_err(|e| StoreError::Protocol(e.to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<Option<Token>> {
        self.changes.subscribe()
    }
}

#[async_trait]
impl UserRecordStore for HttpBackend {
    /// Authenticates with whatever token is cached, if any.
    async fn find_by_id(&self, subject_id: &str) -> Result<Option<UserRecord>, StoreError> {
        let cached = self.cache.load();
        let bearer = cached.as_ref().map(|token| token.access_token.as_str());
        self.fetch_user(self.user_request(subject_id, bearer)).await
    }

    async fn find_for_token(&self, token: &Token) -> Result<Option<UserRecord>, StoreError> {
        self.fetch_user(self.user_request(&token.subject_id, Some(&token.access_token)))
            .await
    }
}

fn transport_error(error: reqwest::Error) -> StoreError {
    StoreError::Unavailable(error.to_string())
}

/// Error for a non-success credential exchange status, `None` on success.
fn exchange_status_error(status: u16) -> Option<StoreError> {
    match status {
        200..=299 => None,
        400 | 401 | 403 => Some(StoreError::Rejected),
        500..=599 => Some(StoreError::Unavailable(format!("backend returned HTTP {status}"))),
        other => Some(StoreError::Protocol(format!("token endpoint returned HTTP {other}"))),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Lookup {
    Found,
    Absent,
    Failed(StoreError),
}

fn lookup_status(status: u16) -> Lookup {
    match status {
        200..=299 => Lookup::Found,
        404 => Lookup::Absent,
        500..=599 => Lookup::Failed(StoreError::Unavailable(format!(
            "backend returned HTTP {status}"
        ))),
        other => Lookup::Failed(StoreError::Protocol(format!(
            "user lookup returned HTTP {other}"
        ))),
    }
}

/// Expiry comes from the response when present, else from the JWT itself.
fn token_from_response(body: TokenResponse) -> Token {
    let expires_at = body
        .expires_at
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .or_else(|| decode_expiry(&body.access_token).ok());
    Token::new(body.access_token, body.user.id, expires_at)
}
