//! Entry-page redirects and the role-dependent navigation menu.

use carelog_core::{Role, Route, SessionState};
use serde::Serialize;

/// Where the root page (`/`) sends the user. `None` while the session is
/// still being restored.
#[must_use]
pub fn root_redirect(state: &SessionState) -> Option<Route> {
    match state {
        SessionState::Unknown => None,
        SessionState::LoggedOut => Some(Route::Login),
        SessionState::LoggedIn(_) => Some(Route::HOME),
    }
}

/// Where the login page sends an already signed-in user.
#[must_use]
pub fn login_redirect(state: &SessionState) -> Option<Route> {
    state.is_logged_in().then_some(Route::HOME)
}

/// One entry in the navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub label: &'static str,
    pub route: Route,
    /// Whether the entry is highlighted for the current path.
    pub active: bool,
}

/// Menu entries visible to `role`, highlighting the one matching `current_path`.
///
/// Home is active only on an exact match; the other entries match by prefix so
/// sub-pages (new/edit forms) keep their section highlighted.
#[must_use]
pub fn menu_for(role: Role, current_path: &str) -> Vec<MenuEntry> {
    let mut entries = vec![
        ("Home", Route::Dashboard),
        ("Weight records", Route::WeightRecords),
    ];
    if role.is_admin() {
        entries.push(("Residents", Route::Residents));
        entries.push(("Staff", Route::StaffAccounts));
    }

    let current = current_path.trim_end_matches('/');
    entries
        .into_iter()
        .map(|(label, route)| {
            let path = route.path();
            let active = if route == Route::Dashboard {
                current == path
            } else {
                current.starts_with(&path)
            };
            MenuEntry {
                label,
                route,
                active,
            }
        })
        .collect()
}

/// Menu for the current session; empty when nobody is signed in.
#[must_use]
pub fn menu_for_state(state: &SessionState, current_path: &str) -> Vec<MenuEntry> {
    state
        .role()
        .map(|role| menu_for(role, current_path))
        .unwrap_or_default()
}
