//! Sign-in and token cache configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_email_domain() -> String {
    "example.com".into()
}

fn default_keyring_service() -> String {
    "carelog".into()
}

const fn default_use_keyring() -> bool {
    true
}

const fn default_expiry_buffer_secs() -> i64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Domain appended to staff numbers to form the backend login e-mail.
    #[serde(default = "default_email_domain")]
    pub email_domain: String,

    /// OS keyring service name for the cached token.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Whether the OS keyring is tried before the credentials file.
    #[serde(default = "default_use_keyring")]
    pub use_keyring: bool,

    /// Credentials file override. Empty means `~/.carelog/credentials`.
    #[serde(default)]
    pub credentials_path: String,

    /// Tokens expiring within this many seconds are treated as absent.
    #[serde(default = "default_expiry_buffer_secs")]
    pub expiry_buffer_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email_domain: default_email_domain(),
            keyring_service: default_keyring_service(),
            use_keyring: default_use_keyring(),
            credentials_path: String::new(),
            expiry_buffer_secs: default_expiry_buffer_secs(),
        }
    }
}

impl AuthConfig {
    /// Resolved credentials file path.
    pub fn credentials_file(&self) -> Option<PathBuf> {
        if self.credentials_path.is_empty() {
            dirs::home_dir().map(|h| h.join(".carelog").join("credentials"))
        } else {
            Some(PathBuf::from(&self.credentials_path))
        }
    }
}
