use async_trait::async_trait;

use pbac_auth::User;

use crate::error::StoreError;

/// User account store.
///
/// Lookups return the user with its full role graph (roles and their
/// permissions) loaded. Usernames and emails are unique.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user together with its roles. Roles and permissions are
    /// created by name when missing.
    async fn insert(&self, user: User) -> Result<User, StoreError>;

    /// Flip the `active` flag. `StoreError::NotFound` if the user is unknown.
    async fn set_active(&self, username: &str, active: bool) -> Result<(), StoreError>;
}
