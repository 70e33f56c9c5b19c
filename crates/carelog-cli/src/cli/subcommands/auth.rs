use clap::{Args, Subcommand};

/// Authentication commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuthCommands {
    /// Sign in with a staff number and password.
    Login(AuthLoginArgs),
    /// Sign out and revoke the stored token.
    Logout,
    /// Show the restored session.
    Status,
}

#[derive(Clone, Debug, Args)]
pub struct AuthLoginArgs {
    /// Staff number (mapped to `{staff_number}@{auth.email_domain}`).
    #[arg(long, short = 's')]
    pub staff_number: String,
    /// Password. Read from stdin when omitted.
    #[arg(long)]
    pub password: Option<String>,
}
