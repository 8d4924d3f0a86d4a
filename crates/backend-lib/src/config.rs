// ============================
// platform-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::{CredentialHasher, HashAlgorithm};
use crate::error::AuthError;
use crate::validation::{CredentialPolicy, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH};

/// Default config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "platform.toml";
/// Prefix for environment overrides, e.g. `PLATFORM_LOG_LEVEL=debug` or
/// `PLATFORM_HASHING__ALGORITHM=argon2id`.
pub const ENV_PREFIX: &str = "PLATFORM_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the credential file
    pub data_dir: PathBuf,
    /// Which credential store backs the authenticator
    pub store: StoreKind,
    /// Log level
    pub log_level: String,
    /// Username and password length rules
    pub policy: CredentialPolicy,
    /// Key derivation settings for new hashes
    pub hashing: HashingSettings,
}

/// Credential store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    File,
}

/// Cost parameters for the password KDFs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingSettings {
    /// Algorithm used for new hashes. Verification accepts every supported scheme.
    pub algorithm: HashAlgorithm,
    pub scrypt_log_n: u8,
    pub scrypt_r: u32,
    pub scrypt_p: u32,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            store: StoreKind::File,
            log_level: "info".to_string(),
            policy: CredentialPolicy::default(),
            hashing: HashingSettings::default(),
        }
    }
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Scrypt,
            scrypt_log_n: 17,
            scrypt_r: 8,
            scrypt_p: 1,
            argon2_memory_kib: 19 * 1024,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl HashingSettings {
    /// Cheap KDF parameters for test suites. Never use these in production.
    pub fn fast_for_tests() -> Self {
        Self {
            scrypt_log_n: 4,
            argon2_memory_kib: 256,
            argon2_iterations: 1,
            ..Self::default()
        }
    }
}

impl Settings {
    /// Load settings from `platform.toml` and `PLATFORM_*` environment variables
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load settings from an explicit file, still honouring environment overrides
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would weaken the credential policy or that the
    /// hash crates cannot run with.
    pub fn validate(&self) -> Result<(), AuthError> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(AuthError::Config(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }

        if self.policy.min_username_length < MIN_USERNAME_LENGTH {
            return Err(AuthError::Config(format!(
                "min_username_length must be at least {MIN_USERNAME_LENGTH}"
            )));
        }

        if self.policy.min_password_length < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Config(format!(
                "min_password_length must be at least {MIN_PASSWORD_LENGTH}"
            )));
        }

        CredentialHasher::from_settings(&self.hashing)?;
        Ok(())
    }
}
