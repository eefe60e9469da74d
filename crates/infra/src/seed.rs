//! Bootstrap accounts for development deployments.

use tracing::info;

use pbac_auth::{Permission, Role, User};
use pbac_core::AuthResult;

use crate::password::Argon2PasswordVerifier;
use crate::user_store::UserStore;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@localhost";
pub const SUPERADMIN_ROLE: &str = "SUPERADMIN";

/// Permissions granted to the seeded superadmin role.
pub const ADMIN_PERMISSIONS: [&str; 5] = [
    "user_findAll",
    "user_findById",
    "user_create",
    "user_update",
    "user_delete",
];

/// Insert the `admin` account unless it already exists.
pub async fn seed_admin(
    users: &dyn UserStore,
    hasher: &Argon2PasswordVerifier,
    password: &str,
) -> AuthResult<User> {
    if let Some(existing) = users.find_by_username(ADMIN_USERNAME).await? {
        info!("admin account already present");
        return Ok(existing);
    }

    let role = Role::new(SUPERADMIN_ROLE, ADMIN_PERMISSIONS.map(Permission::new));
    let admin = User::new(ADMIN_USERNAME, ADMIN_EMAIL, hasher.hash_password(password)?)
        .with_roles([role]);

    let admin = users.insert(admin).await?;
    info!(user_id = %admin.id, "seeded admin account");
    Ok(admin)
}
