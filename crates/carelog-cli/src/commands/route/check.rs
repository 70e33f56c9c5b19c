use std::cell::RefCell;

use carelog_auth::{AuthDecision, AuthGuard, Render, evaluate_route, login_redirect, root_redirect};
use carelog_core::{Route, SessionState};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::RouteCheckArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct RouteCheckResponse {
    path: String,
    access: String,
    session: String,
    decision: AuthDecision,
    render: Render,
    /// Page the UI would navigate to, if any.
    redirect_to: Option<String>,
}

pub async fn handle(
    args: &RouteCheckArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let route = Route::parse(&args.path)
        .ok_or_else(|| anyhow::anyhow!("route check: unknown page '{}'", args.path))?;

    let manager = ctx.restored().await?;
    output(&check(&route, &manager.state()), flags.format)
}

fn check(route: &Route, state: &SessionState) -> RouteCheckResponse {
    let decision = evaluate_route(state, route);
    let navigated = RefCell::new(None);
    let navigator = |to: &Route| *navigated.borrow_mut() = Some(to.path());

    // Entry pages are public but redirect on their own.
    let (render, entry_redirect) = match route {
        Route::Root => (Render::Loading, root_redirect(state)),
        Route::Login => (Render::Children, login_redirect(state)),
        _ => match AuthGuard::for_route(route) {
            Some(mut guard) => (guard.render(state, &navigator), None),
            None => (Render::Children, None),
        },
    };
    let redirect_to = entry_redirect
        .map(|to| to.path())
        .or_else(|| navigated.into_inner());

    RouteCheckResponse {
        path: route.path(),
        access: route.access().to_string(),
        session: state.status().to_string(),
        decision,
        render,
        redirect_to,
    }
}
