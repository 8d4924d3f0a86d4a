// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Static credential policy, applied before any store access.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest username length the policy may be configured with.
pub const MIN_USERNAME_LENGTH: usize = 4;
/// Smallest password length the policy may be configured with.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Possible validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidUsername(String),

    #[error("{0}")]
    InvalidPassword(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Length requirements for usernames and passwords. Lengths count characters,
/// not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPolicy {
    pub min_username_length: usize,
    pub min_password_length: usize,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            min_username_length: MIN_USERNAME_LENGTH,
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }
}

impl CredentialPolicy {
    /// Validate a username
    pub fn validate_username<'a>(&self, username: &'a str) -> ValidationResult<&'a str> {
        if username.is_empty() {
            return Err(ValidationError::InvalidUsername(
                "Username cannot be empty".to_string(),
            ));
        }

        if username.chars().count() < self.min_username_length {
            return Err(ValidationError::InvalidUsername(format!(
                "Username must be at least {} characters",
                self.min_username_length
            )));
        }

        Ok(username)
    }

    /// Validate a password
    pub fn validate_password<'a>(&self, password: &'a str) -> ValidationResult<&'a str> {
        if password.is_empty() {
            return Err(ValidationError::InvalidPassword(
                "Password cannot be empty".to_string(),
            ));
        }

        if password.chars().count() < self.min_password_length {
            return Err(ValidationError::InvalidPassword(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }

        Ok(password)
    }

    /// Validate both halves of a registration request, username first.
    pub fn validate(&self, username: &str, password: &str) -> ValidationResult<()> {
        self.validate_username(username)?;
        self.validate_password(password)?;
        Ok(())
    }
}
