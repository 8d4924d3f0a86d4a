// ============================
// platform-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Every hash is a self-describing string: the algorithm, its cost parameters
//! and the per-hash random salt are all embedded, so verification needs
//! nothing but the stored string. New hashes are scrypt or Argon2id PHC
//! strings. Legacy bcrypt hashes can still be verified.
use argon2::{Algorithm, Argon2, Version};
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Scrypt,
};
use serde::{Deserialize, Serialize};

use crate::config::HashingSettings;
use crate::error::AuthError;

/// Algorithm used when producing new hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Scrypt,
    Argon2id,
}

/// Scheme a stored hash was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    Scrypt,
    Argon2,
    Bcrypt,
}

const BCRYPT_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];

// Cost ceilings applied to stored hashes before any KDF runs, and to the
// configured parameters for new hashes.
pub const MAX_KDF_MEMORY_BYTES: u64 = 1 << 30;
pub const MAX_KDF_PARALLELISM: u32 = 16;
pub const MAX_SCRYPT_LOG_N: u8 = 20;
pub const MAX_SCRYPT_R: u32 = 32;
pub const MAX_ARGON2_ITERATIONS: u32 = 10;
pub const MAX_BCRYPT_COST: u32 = 16;

/// Identify the adaptive scheme behind a stored hash. Anything unrecognised,
/// including bare fast digests, yields `None`.
pub fn hash_scheme(hash: &str) -> Option<HashScheme> {
    if BCRYPT_PREFIXES.iter().any(|prefix| hash.starts_with(prefix)) {
        return Some(HashScheme::Bcrypt);
    }

    let parsed = PasswordHash::new(hash).ok()?;
    match parsed.algorithm.as_str() {
        "scrypt" => Some(HashScheme::Scrypt),
        "argon2id" | "argon2i" | "argon2d" => Some(HashScheme::Argon2),
        _ => None,
    }
}

fn scrypt_within_limits(params: &scrypt::Params) -> bool {
    // scrypt needs 128 * r * 2^ln bytes
    params.log_n() <= MAX_SCRYPT_LOG_N
        && params.r() <= MAX_SCRYPT_R
        && params.p() <= MAX_KDF_PARALLELISM
        && 128 * u64::from(params.r()) * (1u64 << params.log_n()) <= MAX_KDF_MEMORY_BYTES
}

fn argon2_within_limits(params: &argon2::Params) -> bool {
    u64::from(params.m_cost()) * 1024 <= MAX_KDF_MEMORY_BYTES
        && params.t_cost() <= MAX_ARGON2_ITERATIONS
        && params.p_cost() <= MAX_KDF_PARALLELISM
}

/// Cost field of a `$2b$NN$...` hash.
fn bcrypt_cost(hash: &str) -> Option<u32> {
    hash.get(4..6)?.parse().ok()
}

/// Verify a password against a stored hash of any supported scheme.
///
/// Malformed or unsupported hashes verify `false`, and so do hashes whose
/// embedded cost exceeds the ceilings above; the KDF never runs for them.
/// Digest comparison is constant time in every backend.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    match hash_scheme(hash) {
        Some(HashScheme::Bcrypt) => {
            bcrypt_cost(hash).is_some_and(|cost| cost <= MAX_BCRYPT_COST)
                && bcrypt::verify(plain, hash).unwrap_or(false)
        },
        Some(HashScheme::Scrypt) => match PasswordHash::new(hash) {
            Ok(parsed) => {
                scrypt::Params::try_from(&parsed).is_ok_and(|p| scrypt_within_limits(&p))
                    && Scrypt.verify_password(plain.as_bytes(), &parsed).is_ok()
            },
            Err(_) => false,
        },
        Some(HashScheme::Argon2) => match PasswordHash::new(hash) {
            Ok(parsed) => {
                argon2::Params::try_from(&parsed).is_ok_and(|p| argon2_within_limits(&p))
                    && Argon2::default()
                        .verify_password(plain.as_bytes(), &parsed)
                        .is_ok()
            },
            Err(_) => false,
        },
        None => false,
    }
}

/// Produces new hashes with the configured algorithm and cost.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    algorithm: HashAlgorithm,
    scrypt: scrypt::Params,
    argon2: argon2::Params,
}

impl CredentialHasher {
    pub fn from_settings(settings: &HashingSettings) -> Result<Self, AuthError> {
        let scrypt = scrypt::Params::new(
            settings.scrypt_log_n,
            settings.scrypt_r,
            settings.scrypt_p,
            scrypt::Params::RECOMMENDED_LEN,
        )
        .map_err(|e| AuthError::Config(format!("invalid scrypt parameters: {e}")))?;

        let argon2 = argon2::Params::new(
            settings.argon2_memory_kib,
            settings.argon2_iterations,
            settings.argon2_parallelism,
            None,
        )
        .map_err(|e| AuthError::Config(format!("invalid argon2 parameters: {e}")))?;

        if !scrypt_within_limits(&scrypt) || !argon2_within_limits(&argon2) {
            return Err(AuthError::Config(
                "hashing cost exceeds what verification accepts".to_string(),
            ));
        }

        Ok(Self {
            algorithm: settings.algorithm,
            scrypt,
            argon2,
        })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = match self.algorithm {
            HashAlgorithm::Scrypt => Scrypt
                .hash_password_customized(plain.as_bytes(), None, None, self.scrypt.clone(), &salt)?
                .to_string(),
            HashAlgorithm::Argon2id => self
                .argon2id()
                .hash_password(plain.as_bytes(), &salt)?
                .to_string(),
        };
        Ok(hash)
    }

    /// Verify a password against a hash
    pub fn verify(&self, hash: &str, plain: &str) -> bool {
        verify_password(hash, plain)
    }

    fn argon2id(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.argon2.clone())
    }
}
