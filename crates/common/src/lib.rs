// ============================
// platform-common/src/lib.rs
// ============================
//! Types shared between the authentication backend and its callers.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role tag attached to every credential record.
///
/// The set of roles is open ("user", "analyst", "admin", ...). A blank role
/// collapses to [`Role::DEFAULT`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const DEFAULT: &'static str = "user";

    pub fn new(role: impl Into<String>) -> Self {
        let role = role.into();
        match role.trim() {
            "" => Self::default(),
            trimmed => Self(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Role {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        Self::new(role)
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        Self::new(role)
    }
}

/// A stored credential: username, self-describing password hash and role.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            role,
            created_at: Utc::now(),
        }
    }
}

// The hash never shows up in logs or panic messages.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Public view of a user, as returned by administrative listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&CredentialRecord> for UserSummary {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            username: record.username.clone(),
            role: record.role.clone(),
            created_at: record.created_at,
        }
    }
}

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOutcome {
    pub ok: bool,
    pub message: String,
}

impl RegisterOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self { ok: true, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { ok: false, message: message.into() }
    }
}

/// Result of a login attempt. `role` is only present on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOutcome {
    pub ok: bool,
    pub role: Option<Role>,
    pub message: String,
}

impl LoginOutcome {
    pub fn success(role: Role, message: impl Into<String>) -> Self {
        Self { ok: true, role: Some(role), message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { ok: false, role: None, message: message.into() }
    }
}

/// Who is logged in, held by the calling application and passed explicitly
/// into whatever it protects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub username: String,
    pub role: Role,
}

impl SessionContext {
    /// Build a context from a login outcome; `None` unless the login succeeded.
    pub fn from_login(username: &str, outcome: &LoginOutcome) -> Option<Self> {
        match (outcome.ok, &outcome.role) {
            (true, Some(role)) => Some(Self {
                username: username.to_string(),
                role: role.clone(),
            }),
            _ => None,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_str() == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_role_falls_back_to_default() {
        assert_eq!(Role::new("").as_str(), "user");
        assert_eq!(Role::new("   ").as_str(), "user");
        assert_eq!(Role::new(" admin ").as_str(), "admin");
        assert_eq!(Role::default().to_string(), Role::DEFAULT);
    }

    #[test]
    fn record_debug_hides_hash() {
        let record = CredentialRecord::new("alice", "$scrypt$ln=4,r=8,p=1$c2FsdA$aGFzaA", Role::default());
        let debug = format!("{record:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("$scrypt$"));
    }

    #[test]
    fn record_without_role_deserializes_with_default() {
        let record: CredentialRecord = serde_json::from_str(
            r#"{"username":"alice","password_hash":"x","created_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(record.role, Role::default());
    }

    #[test]
    fn role_serializes_as_plain_string() {
        let json = serde_json::to_string(&Role::from("analyst")).unwrap();
        assert_eq!(json, r#""analyst""#);
    }

    #[test]
    fn session_context_only_from_successful_login() {
        let ok = LoginOutcome::success(Role::from("admin"), "Login successful");
        let ctx = SessionContext::from_login("alice", &ok).unwrap();
        assert_eq!(ctx.username, "alice");
        assert!(ctx.has_role("admin"));

        let failed = LoginOutcome::failure("Incorrect password");
        assert!(SessionContext::from_login("alice", &failed).is_none());
    }

    #[test]
    fn summary_drops_hash() {
        let record = CredentialRecord::new("bob1", "secret-hash", Role::from("analyst"));
        let summary = UserSummary::from(&record);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("secret-hash"));
        assert_eq!(summary.role.as_str(), "analyst");
    }
}
