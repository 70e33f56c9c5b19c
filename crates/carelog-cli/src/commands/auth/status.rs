use carelog_auth::AuthErrorKind;
use carelog_core::SessionState;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Default, Serialize)]
struct AuthStatusResponse {
    status: String,
    authenticated: bool,
    subject_id: Option<String>,
    staff_number: Option<String>,
    name: Option<String>,
    role: Option<String>,
    is_admin: bool,
    token_source: Option<String>,
    error: Option<AuthErrorKind>,
    note: Option<String>,
}

impl AuthStatusResponse {
    fn from_state(state: &SessionState) -> Self {
        let session = state.session();
        Self {
            status: state.status().to_string(),
            authenticated: state.is_logged_in(),
            subject_id: session.map(|s| s.subject_id.clone()),
            staff_number: session.map(|s| s.staff_number.clone()),
            name: session.map(|s| s.display_name.clone()),
            role: session.map(|s| s.role.to_string()),
            is_admin: state.is_admin(),
            ..Self::default()
        }
    }
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let Some(backend) = ctx.backend_if_configured() else {
        let status = AuthStatusResponse {
            status: SessionState::LoggedOut.status().to_string(),
            note: Some("CARELOG_BACKEND__URL / CARELOG_BACKEND__ANON_KEY not configured".into()),
            ..AuthStatusResponse::default()
        };
        return output(&status, flags.format);
    };

    let state = backend.manager.restore().await;
    let mut status = AuthStatusResponse::from_state(&state);
    if state.is_logged_in() {
        status.token_source = backend
            .http
            .cache()
            .detect_source()
            .map(|source| source.to_string());
    } else if let Some(error) = backend.manager.last_error() {
        status.error = Some(error.kind());
        status.note = Some(error.user_message().to_string());
    } else {
        status.note = Some("no stored session".into());
    }

    output(&status, flags.format)
}
