//! Cross-cutting error types for AppDesk.
//!
//! Domain-specific errors (`AuthError`, `AppsError`, `ConfigError`) live in
//! their own crates. The CLI converges everything into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any AppDesk crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Reject blank usernames and passwords before they reach the network.
///
/// # Errors
///
/// Returns `CoreError::Validation` naming the first empty field.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), CoreError> {
    if username.trim().is_empty() {
        return Err(CoreError::Validation("username must not be empty".into()));
    }
    if password.is_empty() {
        return Err(CoreError::Validation("password must not be empty".into()));
    }
    Ok(())
}
