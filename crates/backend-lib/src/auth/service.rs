use async_trait::async_trait;
use platform_common::{LoginOutcome, RegisterOutcome, Role};

use crate::error::AuthError;

/// Registration, login and password change over a credential store.
///
/// Policy failures, duplicates and bad credentials come back as `Ok`
/// outcomes; `Err` is reserved for faults the service cannot recover from.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, username: &str, password: &str) -> Result<RegisterOutcome, AuthError> {
        self.register_with_role(username, password, Role::default()).await
    }

    async fn register_with_role(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<RegisterOutcome, AuthError>;

    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError>;

    async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<bool, AuthError>;
}
