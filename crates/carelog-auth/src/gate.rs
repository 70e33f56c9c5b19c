//! Authorization gate: a pure decision table over session state and a
//! required role. It never navigates or performs I/O.

use carelog_core::{Role, Route, SessionState};
use serde::Serialize;
use std::fmt;

/// Outcome of evaluating a session against a required role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthDecision {
    /// Session not restored yet: show a loading indicator, do not navigate.
    Pending,
    Allow,
    RedirectToLogin,
    /// Signed in but lacking the required role.
    RedirectToHome,
}

impl AuthDecision {
    /// Navigation target for redirect decisions.
    #[must_use]
    pub fn redirect_target(self) -> Option<Route> {
        match self {
            Self::RedirectToLogin => Some(Route::Login),
            Self::RedirectToHome => Some(Route::HOME),
            Self::Pending | Self::Allow => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Allow => "allow",
            Self::RedirectToLogin => "redirect_to_login",
            Self::RedirectToHome => "redirect_to_home",
        }
    }
}

impl fmt::Display for AuthDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether `state` may see content requiring `required`.
///
/// `required = None` means any signed-in user.
#[must_use]
pub fn evaluate(state: &SessionState, required: Option<Role>) -> AuthDecision {
    match (state, required) {
        (SessionState::Unknown, _) => AuthDecision::Pending,
        (SessionState::LoggedOut, _) => AuthDecision::RedirectToLogin,
        (SessionState::LoggedIn(_), None) => AuthDecision::Allow,
        (SessionState::LoggedIn(session), Some(role)) => {
            if session.role.satisfies(role) {
                AuthDecision::Allow
            } else {
                AuthDecision::RedirectToHome
            }
        }
    }
}

/// Decide for a concrete route. Public routes are always allowed.
#[must_use]
pub fn evaluate_route(state: &SessionState, route: &Route) -> AuthDecision {
    let access = route.access();
    if access.is_public() {
        return AuthDecision::Allow;
    }
    evaluate(state, access.required_role())
}
