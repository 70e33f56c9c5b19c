//! Collaborator interfaces consumed by the session manager.
//!
//! The identity store owns credentials and tokens; the user record store
//! resolves a token's subject to a staff record. Both are external services,
//! so every call is async and fallible.

use async_trait::async_trait;
use carelog_core::UserRecord;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::error::AuthError;
use crate::token::Token;

/// Failures reported by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend rejected the supplied credentials.
    #[error("credentials rejected")]
    Rejected,

    /// The backend could not be reached (DNS, connect, timeout).
    #[error("backend unreachable: {0}")]
    Unavailable(String),

    /// The backend answered with something we could not use.
    #[error("unexpected backend response: {0}")]
    Protocol(String),
}

impl StoreError {
    /// Conversion used for credential exchange and record lookups.
    #[must_use]
    pub fn into_auth_error(self) -> AuthError {
        match self {
            Self::Rejected => AuthError::InvalidCredentials,
            Self::Unavailable(detail) | Self::Protocol(detail) => {
                AuthError::NetworkUnavailable(detail)
            }
        }
    }
}

/// Service of record for credentials and tokens.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Token currently held, if any.
    async fn active_token(&self) -> Result<Option<Token>, StoreError>;

    /// Exchange a login identifier and secret for a token. The returned token
    /// becomes the active one.
    async fn exchange_credentials(&self, identifier: &str, secret: &str)
    -> Result<Token, StoreError>;

    /// Revoke `token` remotely and forget it locally.
    async fn invalidate(&self, token: &Token) -> Result<(), StoreError>;

    /// Make an already-issued `token` the active one again, locally only.
    /// Used when a discarded exchange overwrote the token of the session
    /// that is actually installed.
    async fn reinstate(&self, token: &Token) -> Result<(), StoreError>;

    /// Changes to the active token that this client did not initiate
    /// (external revocation, expiry, refresh), in the order they happened.
    fn subscribe(&self) -> broadcast::Receiver<Option<Token>>;
}

/// Lookup of staff records by identity subject id.
#[async_trait]
pub trait UserRecordStore: Send + Sync {
    async fn find_by_id(&self, subject_id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Look up the record behind `token`, authenticating as that token where
    /// the store needs credentials. Defaults to [`Self::find_by_id`].
    async fn find_for_token(&self, token: &Token) -> Result<Option<UserRecord>, StoreError> {
        self.find_by_id(&token.subject_id).await
    }
}

/// Login e-mail for a staff number: `{staff_number}@{domain}`.
#[must_use]
pub fn staff_email(staff_number: &str, domain: &str) -> String {
    format!("{}@{}", staff_number.trim(), domain.trim_start_matches('@'))
}
