// ============================
// platform-backend-lib/src/lib.rs
// ============================
//! Authentication core for the intelligence platform: credential hashing,
//! registration, login and password change over a pluggable credential store.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use tracing::info;

use crate::auth::Authenticator;
use crate::config::{Settings, StoreKind};
use crate::error::{AuthError, StoreError};
use crate::storage::{CredentialStore, FlatFileStore, MemoryStore};

pub use platform_common::{CredentialRecord, LoginOutcome, RegisterOutcome, Role, SessionContext, UserSummary};

/// Open the credential store selected in `settings`
pub fn open_store(settings: &Settings) -> Result<Arc<dyn CredentialStore>, StoreError> {
    let store: Arc<dyn CredentialStore> = match settings.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::File => Arc::new(FlatFileStore::new(&settings.data_dir)?),
    };
    Ok(store)
}

/// Validate settings, open the store and build an authenticator over it
pub fn bootstrap(settings: &Settings) -> Result<Authenticator, AuthError> {
    settings.validate()?;
    let store = open_store(settings)?;
    let authenticator = Authenticator::from_settings(store, settings)?;

    info!(
        store = ?settings.store,
        data_dir = %settings.data_dir.display(),
        algorithm = ?settings.hashing.algorithm,
        "authenticator ready"
    );
    Ok(authenticator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthService;
    use crate::config::HashingSettings;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_bootstrap_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            data_dir: temp_dir.path().to_path_buf(),
            hashing: HashingSettings::fast_for_tests(),
            ..Settings::default()
        };

        let auth = bootstrap(&settings).unwrap();
        assert!(auth.register("alice", "longenoughpass").await.unwrap().ok);
        assert!(temp_dir.path().join(storage::USERS_FILE).exists());
    }

    #[test]
    fn test_bootstrap_rejects_invalid_settings() {
        let mut settings = Settings {
            store: StoreKind::Memory,
            ..Settings::default()
        };
        settings.policy.min_password_length = 6;
        assert!(matches!(bootstrap(&settings), Err(AuthError::Config(_))));
    }
}
