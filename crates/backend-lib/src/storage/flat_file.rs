//! Flat-file credential store: one JSON document under the data directory.
use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use platform_common::{CredentialRecord, Role, UserSummary};
use serde::{Deserialize, Serialize};
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, warn};

use super::CredentialStore;
use crate::error::StoreError;

pub const USERS_FILE: &str = "users.json";

type UserMap = BTreeMap<String, CredentialRecord>;

#[derive(Deserialize)]
struct UsersFile {
    users: Vec<CredentialRecord>,
}

#[derive(Serialize)]
struct UsersFileRef<'a> {
    users: Vec<&'a CredentialRecord>,
}

/// Flat-file implementation of the CredentialStore trait
///
/// Every write reloads the file, applies the change and atomically replaces
/// the file (temp file + rename) while holding a process-wide lock, so
/// concurrent writers in one process never lose updates or duplicate a
/// username.
#[derive(Debug)]
pub struct FlatFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FlatFileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        Ok(Self {
            path: root.join(USERS_FILE),
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the credential file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<UserMap, StoreError> {
        let content = match tokio_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(UserMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(UserMap::new());
        }

        let file: UsersFile = serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))?;

        let mut users = UserMap::new();
        for record in file.users {
            if record.username.is_empty() {
                return Err(StoreError::Corrupt("record with empty username".to_string()));
            }
            if let Some(dup) = users.insert(record.username.clone(), record) {
                return Err(StoreError::Corrupt(format!(
                    "username '{}' appears more than once",
                    dup.username
                )));
            }
        }
        Ok(users)
    }

    async fn save(&self, users: &UserMap) -> Result<(), StoreError> {
        let file = UsersFileRef {
            users: users.values().collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let tmp = self.tmp_path();
        if let Err(e) = Self::replace(&tmp, &self.path, json.as_bytes()).await {
            if let Err(cleanup) = tokio_fs::remove_file(&tmp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %cleanup, "could not remove temp file");
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    async fn replace(tmp: &Path, target: &Path, contents: &[u8]) -> std::io::Result<()> {
        let mut out = tokio_fs::File::create(tmp).await?;
        out.write_all(contents).await?;
        out.sync_all().await?;
        drop(out);
        tokio_fs::rename(tmp, target).await
    }

    /// Serialised read-modify-write. Nothing is written if `apply` fails.
    async fn modify<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut UserMap) -> Result<(), StoreError> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut users = self.load().await?;
        apply(&mut users)?;
        self.save(&users).await
    }
}

#[async_trait]
impl CredentialStore for FlatFileStore {
    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: &Role,
    ) -> Result<(), StoreError> {
        self.modify(|users| {
            if users.contains_key(username) {
                return Err(StoreError::DuplicateUser(username.to_string()));
            }
            users.insert(
                username.to_string(),
                CredentialRecord::new(username, password_hash, role.clone()),
            );
            Ok(())
        })
        .await?;

        debug!(username = %username, path = %self.path.display(), "inserted credential record");
        Ok(())
    }

    async fn find(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.load().await?.remove(username))
    }

    async fn update_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        self.modify(|users| {
            let record = users
                .get_mut(username)
                .ok_or_else(|| StoreError::NotFound(username.to_string()))?;
            record.password_hash = password_hash.to_string();
            Ok(())
        })
        .await
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError> {
        // BTreeMap iteration is already sorted by username
        Ok(self.load().await?.values().map(UserSummary::from).collect())
    }

    async fn update_role(&self, username: &str, role: &Role) -> Result<(), StoreError> {
        self.modify(|users| {
            let record = users
                .get_mut(username)
                .ok_or_else(|| StoreError::NotFound(username.to_string()))?;
            record.role = role.clone();
            Ok(())
        })
        .await
    }

    async fn delete_user(&self, username: &str) -> Result<(), StoreError> {
        self.modify(|users| {
            users
                .remove(username)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(username.to_string()))
        })
        .await
    }
}
