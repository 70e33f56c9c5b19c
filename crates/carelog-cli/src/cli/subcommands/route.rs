use clap::{Args, Subcommand};

/// Route access commands.
#[derive(Clone, Debug, Subcommand)]
pub enum RouteCommands {
    /// Decide whether the current session may open a page.
    Check(RouteCheckArgs),
    /// List navigation menu entries for the current session.
    Menu(RouteMenuArgs),
}

#[derive(Clone, Debug, Args)]
pub struct RouteCheckArgs {
    /// Page path (e.g. `/admin/residents`).
    pub path: String,
}

#[derive(Clone, Debug, Args)]
pub struct RouteMenuArgs {
    /// Current page path, used to mark the active entry.
    #[arg(long, default_value = "/dashboard")]
    pub current: String,
}
