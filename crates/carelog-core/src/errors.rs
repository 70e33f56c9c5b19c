//! Cross-cutting error types for carelog.
//!
//! Domain-specific errors (`AuthError`, `ConfigError`) live in their own
//! crates.

use thiserror::Error;

/// Errors that can be raised by any carelog crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (unknown role, malformed path, ...).
    #[error("Validation error: {0}")]
    Validation(String),
}
