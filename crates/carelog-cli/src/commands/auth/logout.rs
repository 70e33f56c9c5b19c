use carelog_auth::AuthErrorKind;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthLogoutResponse {
    signed_out: bool,
    navigate_to: String,
    /// Set when the remote revoke failed; the local session is cleared anyway.
    revoke_error: Option<String>,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let manager = ctx.restored().await?;
    let entry = manager.sign_out().await;

    let revoke_error = manager
        .last_error()
        .filter(|error| error.kind() == AuthErrorKind::RevokeFailed)
        .map(|error| error.to_string());

    output(
        &AuthLogoutResponse {
            signed_out: true,
            navigate_to: entry.path(),
            revoke_error,
        },
        flags.format,
    )
}
