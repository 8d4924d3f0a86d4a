//! Import of the old plain-text `users.txt` credential file.
//!
//! Lines are `username,password_hash[,role]`, optionally preceded by a
//! `username,password_hash,role` header. Only hashes from a recognised
//! adaptive scheme are imported; unsalted digests are refused.
use std::path::Path;

use metrics::counter;
use platform_common::Role;
use tokio::fs as tokio_fs;
use tracing::{info, warn};

use super::CredentialStore;
use crate::auth::hash_scheme;
use crate::error::StoreError;
use crate::metrics::LEGACY_IMPORTED;

const HEADER: &str = "username,password_hash,role";

/// Outcome of a legacy import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Copy every acceptable record of a legacy credential file into `store`.
///
/// Malformed lines, duplicates and non-adaptive hashes are skipped with a
/// warning. Storage faults abort the import.
pub async fn import_legacy_users<S>(store: &S, path: impl AsRef<Path>) -> Result<ImportReport, StoreError>
where
    S: CredentialStore + ?Sized,
{
    let path = path.as_ref();
    let content = tokio_fs::read_to_string(path).await?;
    let mut report = ImportReport::default();

    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .peekable();

    if let Some((_, first)) = lines.peek() {
        if first.eq_ignore_ascii_case(HEADER) {
            lines.next();
        }
    }

    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let (username, hash, role) = match fields.as_slice() {
            [username, hash] => (*username, *hash, Role::default()),
            [username, hash, role] => (*username, *hash, Role::from(*role)),
            _ => {
                warn!(line = line_no, "skipping malformed legacy record");
                report.skipped += 1;
                continue;
            },
        };

        if username.is_empty() {
            warn!(line = line_no, "skipping legacy record without username");
            report.skipped += 1;
            continue;
        }

        if hash_scheme(hash).is_none() {
            warn!(line = line_no, username = %username, "skipping legacy record with unsupported hash scheme");
            report.skipped += 1;
            continue;
        }

        match store.insert(username, hash, &role).await {
            Ok(()) => report.imported += 1,
            Err(StoreError::DuplicateUser(_)) => {
                warn!(line = line_no, username = %username, "skipping legacy record for existing user");
                report.skipped += 1;
            },
            Err(e) => return Err(e),
        }
    }

    counter!(LEGACY_IMPORTED).increment(report.imported as u64);
    info!(
        path = %path.display(),
        imported = report.imported,
        skipped = report.skipped,
        "legacy user import finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use tempfile::TempDir;

    // bcrypt output for "SecurePassword123", cost 4
    fn bcrypt_hash() -> String {
        bcrypt::hash("SecurePassword123", 4).unwrap()
    }

    #[tokio::test]
    async fn test_import_with_header_and_roles() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.txt");
        let hash = bcrypt_hash();
        std::fs::write(
            &path,
            format!("username,password_hash,role\nalice,{hash},admin\n\nbob1,{hash}\n"),
        )
        .unwrap();

        let store = MemoryStore::new();
        let report = import_legacy_users(&store, &path).await.unwrap();
        assert_eq!(report, ImportReport { imported: 2, skipped: 0 });

        assert_eq!(store.find("alice").await.unwrap().unwrap().role.as_str(), "admin");
        assert_eq!(store.find("bob1").await.unwrap().unwrap().role.as_str(), "user");
        assert!(store.find("username").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import_refuses_unsalted_digests() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.txt");
        std::fs::write(
            &path,
            "carol,5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8,user\n",
        )
        .unwrap();

        let store = MemoryStore::new();
        let report = import_legacy_users(&store, &path).await.unwrap();
        assert_eq!(report, ImportReport { imported: 0, skipped: 1 });
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_import_skips_duplicates_and_malformed_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.txt");
        let hash = bcrypt_hash();
        std::fs::write(
            &path,
            format!("alice,{hash}\nalice,{hash}\njust-a-name\n,{hash}\na,b,c,d\n"),
        )
        .unwrap();

        let store = MemoryStore::new();
        store.insert("existing", "h", &Role::default()).await.unwrap();
        let report = import_legacy_users(&store, &path).await.unwrap();
        assert_eq!(report, ImportReport { imported: 1, skipped: 4 });
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = MemoryStore::new();
        let result = import_legacy_users(&store, temp_dir.path().join("absent.txt")).await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
