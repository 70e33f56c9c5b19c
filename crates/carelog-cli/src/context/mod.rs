mod config_warnings;

use std::sync::Arc;

use carelog_auth::{HttpBackend, SessionManager};
use carelog_config::CareConfig;

pub use config_warnings::warn_unconfigured;

/// Backend client and the session manager wired to it.
pub struct Backend {
    pub http: Arc<HttpBackend>,
    pub manager: Arc<SessionManager>,
}

/// Shared state for command handlers.
pub struct AppContext {
    pub config: CareConfig,
    backend: Option<Backend>,
}

impl AppContext {
    /// Wire the session manager. An unconfigured backend is not an error
    /// here; commands that need it fail through [`Self::backend`].
    pub fn init(config: CareConfig) -> anyhow::Result<Self> {
        let backend = if config.backend.is_configured() {
            let http = Arc::new(HttpBackend::new(&config.backend, &config.auth)?);
            let manager = Arc::new(
                SessionManager::new(Arc::clone(&http) as _, Arc::clone(&http) as _)
                    .with_expiry_buffer(config.auth.expiry_buffer_secs),
            );
            Some(Backend { http, manager })
        } else {
            tracing::debug!("backend not configured");
            None
        };
        Ok(Self { config, backend })
    }

    pub fn backend(&self) -> anyhow::Result<&Backend> {
        self.backend.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "backend is not configured; set CARELOG_BACKEND__URL and CARELOG_BACKEND__ANON_KEY"
            )
        })
    }

    pub const fn backend_if_configured(&self) -> Option<&Backend> {
        self.backend.as_ref()
    }

    /// Restored session manager, ready for a command.
    pub async fn restored(&self) -> anyhow::Result<&Arc<SessionManager>> {
        let backend = self.backend()?;
        backend.manager.restore().await;
        Ok(&backend.manager)
    }
}
