//! User account model as seen by the authentication core.
//!
//! Accounts are owned by an external user store; the core reads them and
//! only ever gates token issuance on the `active` flag.

use serde::{Deserialize, Serialize};

use pbac_core::UserId;

use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A user account with its role graph loaded.
///
/// # Invariants
/// - `username` and `email` are unique across the store.
/// - Role order carries no meaning.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub roles: Vec<Role>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            active: true,
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Coarse role check by exact role name (no permission expansion).
    pub fn has_role_named(&self, role_name: &str) -> bool {
        self.roles.iter().any(|r| r.name == role_name)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("active", &self.active)
            .field("roles", &self.roles)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity projection
// ─────────────────────────────────────────────────────────────────────────────

/// Minimal identity returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
}
