use clap::Subcommand;

use super::subcommands::{AuthCommands, RouteCommands};

/// Top-level commands.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Staff sign-in and session management.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// Evaluate page access for the current session.
    Route {
        #[command(subcommand)]
        action: RouteCommands,
    },
}
