//! Application route table.
//!
//! ```text
//! /                              public   (entry point, redirects)
//! /login                         public
//! /dashboard                     signed in (home)
//! /dashboard/weight              signed in
//! /admin                         admin
//! /admin/residents[/new|/edit/{id}]  admin
//! /admin/users[/new|/edit/{id}]      admin
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::enums::Role;
use crate::errors::CoreError;

/// Who may reach a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Public,
    SignedIn,
    Admin,
}

impl Access {
    /// Role the authorization gate must check for, if any.
    ///
    /// `None` for `SignedIn` means "any authenticated role".
    #[must_use]
    pub const fn required_role(self) -> Option<Role> {
        match self {
            Self::Admin => Some(Role::Admin),
            Self::Public | Self::SignedIn => None,
        }
    }

    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::SignedIn => "signed_in",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page in the application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Entry point. Redirects to home or login.
    Root,
    Login,
    /// Home for every signed-in user.
    Dashboard,
    WeightRecords,
    Admin,
    Residents,
    NewResident,
    EditResident(String),
    StaffAccounts,
    NewStaffAccount,
    EditStaffAccount(String),
}

impl Route {
    /// Where a successful sign-in and a role mismatch send the user.
    pub const HOME: Self = Self::Dashboard;
    /// Where sign-out sends the user.
    pub const ENTRY: Self = Self::Root;

    /// Parse a URL path. Trailing slashes and a query string are ignored.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Self::Root,
            ["login"] => Self::Login,
            ["dashboard"] => Self::Dashboard,
            ["dashboard", "weight"] => Self::WeightRecords,
            ["admin"] => Self::Admin,
            ["admin", "residents"] => Self::Residents,
            ["admin", "residents", "new"] => Self::NewResident,
            ["admin", "residents", "edit", id] => Self::EditResident((*id).to_string()),
            ["admin", "users"] => Self::StaffAccounts,
            ["admin", "users", "new"] => Self::NewStaffAccount,
            ["admin", "users", "edit", id] => Self::EditStaffAccount((*id).to_string()),
            _ => return None,
        };
        Some(route)
    }

    /// Canonical path for this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Root => "/".into(),
            Self::Login => "/login".into(),
            Self::Dashboard => "/dashboard".into(),
            Self::WeightRecords => "/dashboard/weight".into(),
            Self::Admin => "/admin".into(),
            Self::Residents => "/admin/residents".into(),
            Self::NewResident => "/admin/residents/new".into(),
            Self::EditResident(id) => format!("/admin/residents/edit/{id}"),
            Self::StaffAccounts => "/admin/users".into(),
            Self::NewStaffAccount => "/admin/users/new".into(),
            Self::EditStaffAccount(id) => format!("/admin/users/edit/{id}"),
        }
    }

    /// Access requirement, decided by the route's section.
    #[must_use]
    pub const fn access(&self) -> Access {
        match self {
            Self::Root | Self::Login => Access::Public,
            Self::Dashboard | Self::WeightRecords => Access::SignedIn,
            Self::Admin
            | Self::Residents
            | Self::NewResident
            | Self::EditResident(_)
            | Self::StaffAccounts
            | Self::NewStaffAccount
            | Self::EditStaffAccount(_) => Access::Admin,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CoreError::Validation(format!("unknown route '{s}'")))
    }
}
