use serde::Serialize;
use thiserror::Error;

/// Failures reported by the session manager.
///
/// Every identity-store and user-record-store failure is converted into one
/// of these at the session manager boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid staff number or password")]
    InvalidCredentials,

    #[error("authentication service unavailable: {0}")]
    NetworkUnavailable(String),

    /// Token is valid but no staff record matches its subject.
    #[error("no staff record found for account {subject_id}")]
    UserRecordMissing { subject_id: String },

    /// Remote revoke failed. Non-fatal: local sign-out still happens.
    #[error("failed to revoke session token: {0}")]
    RevokeFailed(String),

    /// A newer sign-in or restore started before this one finished.
    #[error("superseded by a newer sign-in attempt")]
    Superseded,

    #[error("token store error: {0}")]
    TokenStoreError(String),
}

/// Coarse error classification, for recording and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    InvalidCredentials,
    NetworkUnavailable,
    UserRecordMissing,
    RevokeFailed,
    Superseded,
    TokenStore,
}

impl AuthError {
    #[must_use]
    pub const fn kind(&self) -> AuthErrorKind {
        match self {
            Self::InvalidCredentials => AuthErrorKind::InvalidCredentials,
            Self::NetworkUnavailable(_) => AuthErrorKind::NetworkUnavailable,
            Self::UserRecordMissing { .. } => AuthErrorKind::UserRecordMissing,
            Self::RevokeFailed(_) => AuthErrorKind::RevokeFailed,
            Self::Superseded => AuthErrorKind::Superseded,
            Self::TokenStoreError(_) => AuthErrorKind::TokenStore,
        }
    }

    /// Short message for the sign-in screen.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Incorrect staff number or password.",
            Self::NetworkUnavailable(_) => "Could not reach the server. Please try again.",
            Self::UserRecordMissing { .. } => {
                "Staff record not found. Please contact an administrator."
            }
            Self::RevokeFailed(_) | Self::TokenStoreError(_) => "Authentication failed.",
            Self::Superseded => "Another sign-in attempt is in progress.",
        }
    }
}
