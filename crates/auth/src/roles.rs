use serde::{Deserialize, Serialize};

use crate::Permission;

/// Prefix that turns a role name into a role authority ("ADMIN" → "ROLE_ADMIN").
pub const ROLE_PREFIX: &str = "ROLE_";

/// A named bundle of permissions.
///
/// Read-only from the point of view of the authentication core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(name: impl Into<String>, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The authority string this role contributes to an authority set.
    pub fn authority(&self) -> String {
        format!("{ROLE_PREFIX}{}", self.name)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}
