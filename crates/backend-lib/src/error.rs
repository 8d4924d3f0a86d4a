// crates/backend-lib/src/error.rs

//! Central error types for the credential store and the authenticator.
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised by a [`CredentialStore`](crate::storage::CredentialStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user '{0}' already exists")]
    DuplicateUser(String),

    #[error("user '{0}' not found")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("credential store is corrupt: {0}")]
    Corrupt(String),
}

/// Authentication error types with error codes
///
/// `Validation`, `DuplicateUser`, `NotFound` and `AuthFailure` are recoverable:
/// the authenticator folds them into outcome messages. Everything else is a
/// hard failure handed back to the caller.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Username already exists")]
    DuplicateUser,

    #[error("User not found")]
    NotFound,

    #[error("Incorrect password")]
    AuthFailure,

    #[error("Password hashing error: {0}")]
    Hash(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUser(_) => AuthError::DuplicateUser,
            StoreError::NotFound(_) => AuthError::NotFound,
            other => AuthError::Storage(other),
        }
    }
}

impl AuthError {
    /// Whether this error is reported to callers as a plain outcome message.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::Validation(_)
                | AuthError::DuplicateUser
                | AuthError::NotFound
                | AuthError::AuthFailure
        )
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VAL_001",
            AuthError::DuplicateUser => "USR_001",
            AuthError::NotFound => "USR_002",
            AuthError::AuthFailure => "AUTH_001",
            AuthError::Hash(_) => "HASH_001",
            AuthError::Storage(_) => "STORE_001",
            AuthError::Config(_) => "CFG_001",
        }
    }

    /// Get a sanitized message suitable for showing to end users
    pub fn sanitized_message(&self) -> String {
        match self {
            AuthError::Hash(_) | AuthError::Storage(_) => {
                "An internal error occurred".to_string()
            },
            AuthError::Config(_) => "Service is misconfigured".to_string(),
            recoverable => recoverable.to_string(),
        }
    }
}

impl From<scrypt::password_hash::Error> for AuthError {
    fn from(err: scrypt::password_hash::Error) -> Self {
        AuthError::Hash(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Hash(format!("hashing task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_auth_error_display() {
        assert_eq!(AuthError::DuplicateUser.to_string(), "Username already exists");
        assert_eq!(AuthError::NotFound.to_string(), "User not found");
        assert_eq!(AuthError::AuthFailure.to_string(), "Incorrect password");

        let validation = AuthError::from(ValidationError::InvalidUsername(
            "Username cannot be empty".to_string(),
        ));
        assert_eq!(validation.to_string(), "Username cannot be empty");
    }

    #[test]
    fn test_store_error_mapping() {
        let dup: AuthError = StoreError::DuplicateUser("alice".to_string()).into();
        assert!(matches!(dup, AuthError::DuplicateUser));

        let missing: AuthError = StoreError::NotFound("alice".to_string()).into();
        assert!(matches!(missing, AuthError::NotFound));

        let io: AuthError = StoreError::Io(IoError::new(ErrorKind::PermissionDenied, "denied")).into();
        assert!(matches!(io, AuthError::Storage(StoreError::Io(_))));
        assert!(!io.is_recoverable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::AuthFailure.error_code(), "AUTH_001");
        assert_eq!(AuthError::DuplicateUser.error_code(), "USR_001");
        assert_eq!(AuthError::NotFound.error_code(), "USR_002");
        assert_eq!(
            AuthError::Storage(StoreError::Corrupt("bad".to_string())).error_code(),
            "STORE_001"
        );
    }

    #[test]
    fn test_sanitized_message_hides_internals() {
        let err = AuthError::Storage(StoreError::Corrupt("/var/lib/users.json line 3".to_string()));
        assert_eq!(err.sanitized_message(), "An internal error occurred");
        assert_eq!(AuthError::AuthFailure.sanitized_message(), "Incorrect password");
    }

    #[test]
    fn test_store_error_from_impls() {
        let io_err = IoError::new(ErrorKind::NotFound, "missing");
        assert!(matches!(StoreError::from(io_err), StoreError::Io(_)));

        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(matches!(StoreError::from(json_err), StoreError::Json(_)));
    }
}
