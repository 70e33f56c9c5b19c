//! Enumerations shared across carelog.
//!
//! All enums use `snake_case` serialization so they match the values stored in
//! the backend's `users.role` column.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Role held by a staff account.
///
/// `Admin` has full management access (residents, staff accounts).
/// `Staff` can only enter and view weight records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Self; 2] = [Self::Admin, Self::Staff];

    /// Return the string representation used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }

    /// Human-facing label shown next to the signed-in user's name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Staff => "Staff",
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether a holder of this role satisfies a `required` role.
    ///
    /// Admins satisfy every requirement; staff satisfy only `Staff`.
    #[must_use]
    pub const fn satisfies(self, required: Self) -> bool {
        match (self, required) {
            (Self::Admin, _) | (Self::Staff, Self::Staff) => true,
            (Self::Staff, Self::Admin) => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            other => Err(CoreError::Validation(format!(
                "unknown role '{other}' (expected 'admin' or 'staff')"
            ))),
        }
    }
}
