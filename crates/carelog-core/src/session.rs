//! Session state published by the session manager.
//!
//! ```text
//! unknown → logged_out ⇄ logged_in
//!         → logged_in
//! ```
//!
//! `Unknown` is the initial state only; nothing transitions back into it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::Role;
use crate::user::UserRecord;

/// The authenticated identity and role currently active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identity backend subject id (also the `users.id` primary key).
    pub subject_id: String,
    pub staff_number: String,
    pub display_name: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from a resolved user record.
    #[must_use]
    pub fn from_record(record: &UserRecord, issued_at: DateTime<Utc>) -> Self {
        Self {
            subject_id: record.id.clone(),
            staff_number: record.staff_number.clone(),
            display_name: record.display_name().to_string(),
            role: record.role,
            issued_at,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Coarse session status, used for transition checks and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unknown,
    LoggedOut,
    LoggedIn,
}

impl SessionStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Unknown | Self::LoggedOut | Self::LoggedIn => &[Self::LoggedOut, Self::LoggedIn],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::LoggedOut => "logged_out",
            Self::LoggedIn => "logged_in",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full session state, including the session itself when logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    /// Restore has not completed yet.
    #[default]
    Unknown,
    LoggedOut,
    LoggedIn(Session),
}

impl SessionState {
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        match self {
            Self::Unknown => SessionStatus::Unknown,
            Self::LoggedOut => SessionStatus::LoggedOut,
            Self::LoggedIn(_) => SessionStatus::LoggedIn,
        }
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::LoggedIn(session) => Some(session),
            Self::Unknown | Self::LoggedOut => None,
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.session().map(|s| s.role)
    }

    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(Role::is_admin)
    }
}
