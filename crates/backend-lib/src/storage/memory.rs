//! Process-local credential store.
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use platform_common::{CredentialRecord, Role, UserSummary};
use tracing::debug;

use super::CredentialStore;
use crate::error::StoreError;

/// In-memory store keyed by username. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, CredentialRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.users.contains_key(username))
    }

    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: &Role,
    ) -> Result<(), StoreError> {
        // the entry guard holds the shard lock, so check-and-insert is atomic
        match self.users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateUser(username.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(CredentialRecord::new(username, password_hash, role.clone()));
                debug!(username = %username, "inserted credential record");
                Ok(())
            },
        }
    }

    async fn find(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.users.get(username).map(|r| r.value().clone()))
    }

    async fn update_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut record = self
            .users
            .get_mut(username)
            .ok_or_else(|| StoreError::NotFound(username.to_string()))?;
        record.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError> {
        let mut users: Vec<UserSummary> = self
            .users
            .iter()
            .map(|r| UserSummary::from(r.value()))
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update_role(&self, username: &str, role: &Role) -> Result<(), StoreError> {
        let mut record = self
            .users
            .get_mut(username)
            .ok_or_else(|| StoreError::NotFound(username.to_string()))?;
        record.role = role.clone();
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> Result<(), StoreError> {
        self.users
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(username.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::new();
        assert!(!store.exists("alice").await.unwrap());

        store.insert("alice", "hash-1", &Role::default()).await.unwrap();
        assert!(store.exists("alice").await.unwrap());

        let record = store.find("alice").await.unwrap().unwrap();
        assert_eq!(record.username, "alice");
        assert_eq!(record.password_hash, "hash-1");
        assert_eq!(record.role.as_str(), "user");
    }

    #[tokio::test]
    async fn test_lookup_is_exact() {
        let store = MemoryStore::new();
        store.insert("alice", "hash-1", &Role::default()).await.unwrap();

        assert!(store.find("Alice").await.unwrap().is_none());
        assert!(store.find("alic").await.unwrap().is_none());
        assert!(store.find("alice ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_does_not_overwrite() {
        let store = MemoryStore::new();
        store.insert("alice", "hash-1", &Role::default()).await.unwrap();

        let err = store.insert("alice", "hash-2", &Role::from("admin")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUser(ref u) if u == "alice"));

        let record = store.find("alice").await.unwrap().unwrap();
        assert_eq!(record.password_hash, "hash-1");
        assert_eq!(record.role.as_str(), "user");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert("racer", &format!("hash-{i}"), &Role::default()).await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => wins += 1,
                Err(StoreError::DuplicateUser(_)) => {},
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_admin_operations() {
        let store = MemoryStore::new();
        store.insert("carol", "h", &Role::default()).await.unwrap();
        store.insert("alice", "h", &Role::from("analyst")).await.unwrap();

        let names: Vec<_> = store
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["alice", "carol"]);

        store.update_role("carol", &Role::from("admin")).await.unwrap();
        assert_eq!(store.find("carol").await.unwrap().unwrap().role.as_str(), "admin");

        store.delete_user("carol").await.unwrap();
        assert!(!store.exists("carol").await.unwrap());
        assert!(matches!(
            store.delete_user("carol").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.update_role("nobody", &Role::default()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.update_password_hash("nobody", "h").await,
            Err(StoreError::NotFound(_))
        ));
    }
}
