use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Role;

/// A staff account as stored in the backend's `users` table.
///
/// `id` is the identity backend's subject id; a record exists for every
/// account that is allowed to hold a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    /// Staff number used as the login identifier.
    pub staff_number: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Name to show in the UI. Falls back to the staff number when the
    /// record has no name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.staff_number
        } else {
            &self.name
        }
    }
}
