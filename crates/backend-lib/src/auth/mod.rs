// ============================
// platform-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
mod service;
mod service_impl;

pub use password::{hash_scheme, verify_password, CredentialHasher, HashAlgorithm, HashScheme};
pub use service::AuthService;
pub use service_impl::{Authenticator, MSG_ACCOUNT_CREATED, MSG_LOGIN_OK};
