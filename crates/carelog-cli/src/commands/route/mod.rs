mod check;
mod menu;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::RouteCommands;
use crate::context::AppContext;

/// Handle `carelog route <subcommand>`.
pub async fn handle(
    action: &RouteCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        RouteCommands::Check(args) => check::handle(args, ctx, flags).await,
        RouteCommands::Menu(args) => menu::handle(args, ctx, flags).await,
    }
}
