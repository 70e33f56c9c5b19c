use std::io::BufRead;

use carelog_auth::staff_email;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthLoginArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthLoginResponse {
    authenticated: bool,
    subject_id: String,
    staff_number: String,
    name: String,
    role: String,
    navigate_to: String,
}

pub async fn handle(
    args: &AuthLoginArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let manager = ctx.restored().await?;

    let password = match &args.password {
        Some(password) => password.clone(),
        None => read_password()?,
    };
    let email = staff_email(&args.staff_number, &ctx.config.auth.email_domain);

    let signed_in = match manager.sign_in(&email, &password).await {
        Ok(signed_in) => signed_in,
        Err(error) => {
            let message = error.user_message();
            return Err(anyhow::Error::new(error).context(format!("auth login: {message}")));
        }
    };

    output(
        &AuthLoginResponse {
            authenticated: true,
            subject_id: signed_in.session.subject_id,
            staff_number: signed_in.session.staff_number,
            name: signed_in.session.display_name,
            role: signed_in.session.role.to_string(),
            navigate_to: signed_in.navigate_to.path(),
        },
        flags.format,
    )
}

/// First line of stdin, without the trailing newline.
fn read_password() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|error| anyhow::anyhow!("auth login: failed to read password from stdin: {error}"))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
