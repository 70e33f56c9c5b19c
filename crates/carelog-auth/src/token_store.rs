use std::fs;
use std::path::{Path, PathBuf};

use carelog_config::AuthConfig;

use crate::error::AuthError;
use crate::token::Token;

const KEYRING_USER: &str = "session-token";
const TOKEN_ENV_VAR: &str = "CARELOG_AUTH__TOKEN";

/// Where a loaded token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Keyring,
    Env,
    File,
}

impl TokenSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keyring => "keyring",
            Self::Env => "env",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persists the session token between runs.
///
/// Tiers, in load priority: OS keychain → `CARELOG_AUTH__TOKEN` env (a raw
/// JWT) → JSON credentials file. Writes go to the keychain and fall back to
/// the file when the keychain is unavailable.
#[derive(Debug, Clone)]
pub struct TokenCache {
    keyring_service: Option<String>,
    read_env: bool,
    path: Option<PathBuf>,
}

impl TokenCache {
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            keyring_service: config
                .use_keyring
                .then(|| config.keyring_service.clone()),
            read_env: true,
            path: config.credentials_file(),
        }
    }

    /// File-only cache at `path`; never touches the keychain or env.
    #[must_use]
    pub fn file_only(path: impl Into<PathBuf>) -> Self {
        Self {
            keyring_service: None,
            read_env: false,
            path: Some(path.into()),
        }
    }

    /// Store `token`. Falls back to the file if the keychain is unavailable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if no tier accepted the token.
    pub fn store(&self, token: &Token) -> Result<(), AuthError> {
        let json = serde_json::to_string(token)
            .map_err(|e| AuthError::TokenStoreError(format!("serialize token: {e}")))?;

        if let Some(entry) = self.keyring_entry() {
            match entry.set_password(&json) {
                Ok(()) => return Ok(()),
                Err(error) => tracing::warn!(%error, "keyring store failed; falling back to file"),
            }
        }
        self.store_file(&json)
    }

    /// Load a token. Unreadable entries are skipped, not reported.
    #[must_use]
    pub fn load(&self) -> Option<Token> {
        self.load_with_source().map(|(token, _)| token)
    }

    #[must_use]
    pub fn load_with_source(&self) -> Option<(Token, TokenSource)> {
        if let Some(entry) = self.keyring_entry()
            && let Ok(json) = entry.get_password()
            && let Some(token) = parse_stored(&json)
        {
            return Some((token, TokenSource::Keyring));
        }

        if self.read_env
            && let Ok(jwt) = std::env::var(TOKEN_ENV_VAR)
            && !jwt.trim().is_empty()
        {
            match Token::from_jwt(jwt.trim()) {
                Ok(token) => return Some((token, TokenSource::Env)),
                Err(error) => tracing::warn!(%error, "ignoring {TOKEN_ENV_VAR}"),
            }
        }

        self.path
            .as_deref()
            .and_then(load_file)
            .map(|token| (token, TokenSource::File))
    }

    /// Which tier currently holds a token (for status display).
    #[must_use]
    pub fn detect_source(&self) -> Option<TokenSource> {
        self.load_with_source().map(|(_, source)| source)
    }

    /// Remove the token from keychain and file.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if the credentials file cannot be removed.
    pub fn delete(&self) -> Result<(), AuthError> {
        if let Some(entry) = self.keyring_entry() {
            let _ = entry.delete_credential();
        }
        if let Some(path) = &self.path
            && path.exists()
        {
            fs::remove_file(path).map_err(|e| {
                AuthError::TokenStoreError(format!("failed to delete {}: {e}", path.display()))
            })?;
        }
        Ok(())
    }

    /// Delete the cached token only if it is `token`. Returns whether it was.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::delete`] failures.
    pub fn clear_if(&self, token: &Token) -> Result<bool, AuthError> {
        if self.load().as_ref() == Some(token) {
            self.delete()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn keyring_entry(&self) -> Option<keyring::Entry> {
        let service = self.keyring_service.as_deref()?;
        match keyring::Entry::new(service, KEYRING_USER) {
            Ok(entry) => Some(entry),
            Err(error) => {
                tracing::debug!(%error, "keyring unavailable");
                None
            }
        }
    }

    fn store_file(&self, json: &str) -> Result<(), AuthError> {
        let path = self.path.as_deref().ok_or_else(|| {
            AuthError::TokenStoreError("home directory not found; cannot store credentials".into())
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::TokenStoreError(format!("mkdir {}: {e}", parent.display()))
            })?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }
        fs::write(path, json)
            .map_err(|e| AuthError::TokenStoreError(format!("write {}: {e}", path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                AuthError::TokenStoreError(format!("chmod {}: {e}", path.display()))
            })?;
        }
        Ok(())
    }
}

fn parse_stored(json: &str) -> Option<Token> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

fn load_file(path: &Path) -> Option<Token> {
    fs::read_to_string(path).ok().as_deref().and_then(parse_stored)
}
