use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use platform_common::{CredentialRecord, LoginOutcome, RegisterOutcome, Role};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::{verify_password, AuthService, CredentialHasher};
use crate::config::Settings;
use crate::error::{AuthError, StoreError};
use crate::metrics::{
    LOGIN_FAILURE, LOGIN_SUCCESS, PASSWORD_CHANGED, REGISTER_ACCEPTED, REGISTER_REJECTED,
};
use crate::storage::CredentialStore;
use crate::validation::CredentialPolicy;

pub const MSG_ACCOUNT_CREATED: &str = "Account created successfully";
pub const MSG_LOGIN_OK: &str = "Login successful";

/// Stateless authenticator over a shared [`CredentialStore`].
///
/// KDF work runs on the blocking pool; plaintext copies handed to it are
/// wiped on drop.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<CredentialHasher>,
    policy: CredentialPolicy,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: CredentialHasher,
        policy: CredentialPolicy,
    ) -> Self {
        Self {
            store,
            hasher: Arc::new(hasher),
            policy,
        }
    }

    pub fn from_settings(store: Arc<dyn CredentialStore>, settings: &Settings) -> Result<Self, AuthError> {
        let hasher = CredentialHasher::from_settings(&settings.hashing)?;
        Ok(Self::new(store, hasher, settings.policy))
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn policy(&self) -> &CredentialPolicy {
        &self.policy
    }

    async fn hash_blocking(&self, plain: &str) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let plain = Zeroizing::new(plain.to_owned());
        tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
    }

    async fn verify_blocking(&self, hash: String, plain: &str) -> Result<bool, AuthError> {
        let plain = Zeroizing::new(plain.to_owned());
        Ok(tokio::task::spawn_blocking(move || verify_password(&hash, &plain)).await?)
    }

    async fn try_register(&self, username: &str, password: &str, role: &Role) -> Result<(), AuthError> {
        self.policy.validate(username, password)?;

        if self.store.exists(username).await? {
            return Err(AuthError::DuplicateUser);
        }

        let hash = self.hash_blocking(password).await?;
        // the store has the final say if another registration raced us
        self.store.insert(username, &hash, role).await?;
        Ok(())
    }

    /// Look the user up and check the password. Returns the stored record.
    /// Read-only: the stored hash is left exactly as found.
    async fn authenticate(&self, username: &str, password: &str) -> Result<CredentialRecord, AuthError> {
        let record = self
            .store
            .find(username)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !self.verify_blocking(record.password_hash.clone(), password).await? {
            return Err(AuthError::AuthFailure);
        }
        Ok(record)
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register_with_role(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<RegisterOutcome, AuthError> {
        match self.try_register(username, password, &role).await {
            Ok(()) => {
                counter!(REGISTER_ACCEPTED).increment(1);
                info!(username = %username, role = %role, "registered new user");
                Ok(RegisterOutcome::success(MSG_ACCOUNT_CREATED))
            },
            Err(e) if e.is_recoverable() => {
                counter!(REGISTER_REJECTED).increment(1);
                warn!(username = %username, code = e.error_code(), "registration rejected");
                Ok(RegisterOutcome::failure(e.to_string()))
            },
            Err(e) => Err(e),
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        match self.authenticate(username, password).await {
            Ok(record) => {
                counter!(LOGIN_SUCCESS).increment(1);
                info!(username = %username, role = %record.role, "login succeeded");
                Ok(LoginOutcome::success(record.role, MSG_LOGIN_OK))
            },
            Err(e) if e.is_recoverable() => {
                counter!(LOGIN_FAILURE).increment(1);
                warn!(username = %username, code = e.error_code(), "login failed");
                Ok(LoginOutcome::failure(e.to_string()))
            },
            Err(e) => Err(e),
        }
    }

    async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<bool, AuthError> {
        let record = match self.authenticate(username, old_password).await {
            Ok(record) => record,
            Err(e) if e.is_recoverable() => {
                warn!(username = %username, code = e.error_code(), "password change refused");
                return Ok(false);
            },
            Err(e) => return Err(e),
        };

        if let Err(e) = self.policy.validate_password(new_password) {
            debug!(username = %username, reason = %e, "new password rejected by policy");
            return Ok(false);
        }

        let hash = self.hash_blocking(new_password).await?;
        match self.store.update_password_hash(&record.username, &hash).await {
            Ok(()) => {
                counter!(PASSWORD_CHANGED).increment(1);
                info!(username = %username, "password changed");
                Ok(true)
            },
            // deleted between verification and update
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashingSettings;
    use crate::storage::MemoryStore;

    fn authenticator() -> Authenticator {
        let hasher = CredentialHasher::from_settings(&HashingSettings::fast_for_tests()).unwrap();
        Authenticator::new(Arc::new(MemoryStore::new()), hasher, CredentialPolicy::default())
    }

    #[tokio::test]
    async fn test_validation_happens_before_store_access() {
        let auth = authenticator();

        let outcome = auth.register("abc", "longenoughpass").await.unwrap();
        assert!(!outcome.ok);
        assert_eq!(outcome.message, "Username must be at least 4 characters");

        let outcome = auth.register("abcd", "1234567").await.unwrap();
        assert!(!outcome.ok);
        assert_eq!(outcome.message, "Password must be at least 8 characters");

        assert!(auth.store().list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_boundaries_pass() {
        let auth = authenticator();
        let outcome = auth.register("abcd", "12345678").await.unwrap();
        assert!(outcome.ok, "{}", outcome.message);
        assert_eq!(outcome.message, MSG_ACCOUNT_CREATED);
    }

    #[tokio::test]
    async fn test_stored_hash_is_not_plaintext() {
        let auth = authenticator();
        auth.register("alice", "longenoughpass").await.unwrap();

        let record = auth.store().find("alice").await.unwrap().unwrap();
        assert_ne!(record.password_hash, "longenoughpass");
        assert!(!record.password_hash.contains("longenoughpass"));
        assert!(record.password_hash.starts_with("$scrypt$"));
    }

    #[tokio::test]
    async fn test_messages_never_echo_secrets() {
        let auth = authenticator();
        auth.register("alice", "longenoughpass").await.unwrap();
        let hash = auth.store().find("alice").await.unwrap().unwrap().password_hash;

        let ok = auth.login("alice", "longenoughpass").await.unwrap();
        let bad = auth.login("alice", "wrongpass").await.unwrap();
        for message in [ok.message, bad.message] {
            assert!(!message.contains("longenoughpass"));
            assert!(!message.contains("wrongpass"));
            assert!(!message.contains(&hash));
        }
    }

    #[tokio::test]
    async fn test_change_password_enforces_policy() {
        let auth = authenticator();
        auth.register("alice", "longenoughpass").await.unwrap();

        assert!(!auth.change_password("alice", "longenoughpass", "short").await.unwrap());
        assert!(auth.login("alice", "longenoughpass").await.unwrap().ok);
    }

    #[tokio::test]
    async fn test_login_leaves_stored_hash_untouched() {
        let auth = authenticator();
        auth.register("alice", "longenoughpass").await.unwrap();
        let before = auth.store().find("alice").await.unwrap().unwrap();

        assert!(auth.login("alice", "longenoughpass").await.unwrap().ok);
        assert!(!auth.login("alice", "wrongpass").await.unwrap().ok);

        let after = auth.store().find("alice").await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_change_password_unknown_user() {
        let auth = authenticator();
        assert!(!auth.change_password("ghost", "whatever1", "whatever2").await.unwrap());
    }
}
