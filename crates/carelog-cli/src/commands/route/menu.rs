use carelog_auth::menu_for_state;
use carelog_core::SessionState;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::RouteMenuArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct MenuItem {
    label: &'static str,
    path: String,
    active: bool,
}

#[derive(Debug, Serialize)]
struct RouteMenuResponse {
    role: Option<String>,
    entries: Vec<MenuItem>,
}

pub async fn handle(
    args: &RouteMenuArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let manager = ctx.restored().await?;
    output(&menu(&manager.state(), &args.current), flags.format)
}

fn menu(state: &SessionState, current: &str) -> RouteMenuResponse {
    RouteMenuResponse {
        role: state.role().map(|role| role.label().to_string()),
        entries: menu_for_state(state, current)
            .into_iter()
            .map(|entry| MenuItem {
                label: entry.label,
                path: entry.route.path(),
                active: entry.active,
            })
            .collect(),
    }
}
