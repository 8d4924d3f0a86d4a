// ============================
// platform-backend-lib/src/storage/mod.rs
// ============================
//! Credential store abstraction with in-memory and flat-file implementations.
use async_trait::async_trait;
use platform_common::{CredentialRecord, Role, UserSummary};

use crate::error::StoreError;

mod flat_file;
pub mod legacy;
mod memory;

pub use flat_file::{FlatFileStore, USERS_FILE};
pub use legacy::{import_legacy_users, ImportReport};
pub use memory::MemoryStore;

/// Trait for credential storage backends
///
/// Usernames compare by exact, case-sensitive equality. `insert` is the
/// arbiter of uniqueness: of two concurrent inserts for one username exactly
/// one succeeds and the other fails with [`StoreError::DuplicateUser`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether a record exists for `username`
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.find(username).await?.is_some())
    }

    /// Insert a new record; never overwrites an existing one
    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: &Role,
    ) -> Result<(), StoreError>;

    /// Fetch the full record for `username`
    async fn find(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError>;

    /// Replace the stored hash of an existing record
    async fn update_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError>;

    /// All users, sorted by username, without their hashes
    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError>;

    /// Change the role of an existing record
    async fn update_role(&self, username: &str, role: &Role) -> Result<(), StoreError>;

    /// Remove a record. Administrative only; the authenticator never calls this.
    async fn delete_user(&self, username: &str) -> Result<(), StoreError>;
}
