//! Route composer: turns gate decisions into navigation.
//!
//! The composer is the only place that navigates. It remembers the redirect it
//! already issued so that re-evaluating the same steady-state decision (every
//! observer notification, every re-render) does not navigate again.

use carelog_core::{Role, Route, SessionState};
use serde::Serialize;

use crate::gate::{AuthDecision, evaluate};

/// Performs navigation on behalf of the composer.
pub trait Navigator {
    fn navigate(&self, to: &Route);
}

impl<F> Navigator for F
where
    F: Fn(&Route),
{
    fn navigate(&self, to: &Route) {
        self(to);
    }
}

/// What the protected region should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Render {
    /// Loading indicator: session pending or a redirect is under way.
    Loading,
    /// The protected content itself.
    Children,
}

#[derive(Debug, Default)]
pub struct RouteComposer {
    redirected_to: Option<Route>,
}

impl RouteComposer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            redirected_to: None,
        }
    }

    /// Redirect already issued and not yet cleared by an `Allow`.
    #[must_use]
    pub const fn redirected_to(&self) -> Option<&Route> {
        self.redirected_to.as_ref()
    }

    /// Act on `decision`. Navigates at most once per distinct redirect target.
    pub fn apply(&mut self, decision: AuthDecision, navigator: &dyn Navigator) -> Render {
        match decision {
            AuthDecision::Allow => {
                self.redirected_to = None;
                Render::Children
            }
            AuthDecision::Pending => Render::Loading,
            AuthDecision::RedirectToLogin | AuthDecision::RedirectToHome => {
                if let Some(target) = decision.redirect_target()
                    && self.redirected_to.as_ref() != Some(&target)
                {
                    tracing::debug!(%decision, to = %target, "redirecting");
                    navigator.navigate(&target);
                    self.redirected_to = Some(target);
                }
                Render::Loading
            }
        }
    }
}

/// Wraps protected content with a role requirement.
///
/// `AuthGuard::signed_in()` admits any authenticated user;
/// `AuthGuard::require_role(Role::Admin)` admits administrators only.
#[derive(Debug, Default)]
pub struct AuthGuard {
    required: Option<Role>,
    composer: RouteComposer,
}

impl AuthGuard {
    #[must_use]
    pub const fn signed_in() -> Self {
        Self {
            required: None,
            composer: RouteComposer::new(),
        }
    }

    #[must_use]
    pub const fn require_role(role: Role) -> Self {
        Self {
            required: Some(role),
            composer: RouteComposer::new(),
        }
    }

    /// Guard for a route, or `None` for public routes.
    #[must_use]
    pub fn for_route(route: &Route) -> Option<Self> {
        let access = route.access();
        if access.is_public() {
            return None;
        }
        Some(access.required_role().map_or_else(Self::signed_in, Self::require_role))
    }

    #[must_use]
    pub const fn required_role(&self) -> Option<Role> {
        self.required
    }

    /// Pure decision for `state`, without navigating.
    #[must_use]
    pub fn decision(&self, state: &SessionState) -> AuthDecision {
        evaluate(state, self.required)
    }

    /// Evaluate `state` and act on the decision.
    pub fn render(&mut self, state: &SessionState, navigator: &dyn Navigator) -> Render {
        let decision = self.decision(state);
        self.composer.apply(decision, navigator)
    }
}
