//! Authority-set derivation (role/permission flattening).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Role, User, roles::ROLE_PREFIX};

/// Flat set of authority strings used for authorization decisions.
///
/// Contains `ROLE_<name>` for every role and every permission name granted by
/// those roles. Ordered so that serialized output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthoritySet(BTreeSet<String>);

impl AuthoritySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, authority: impl Into<String>) -> bool {
        self.0.insert(authority.into())
    }

    pub fn contains(&self, authority: &str) -> bool {
        self.0.contains(authority)
    }

    /// Whether the set holds the role authority for `role_name`.
    pub fn has_role(&self, role_name: &str) -> bool {
        self.0.contains(&format!("{ROLE_PREFIX}{role_name}"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for AuthoritySet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Flatten a user's roles and their permissions into an authority set.
///
/// - No IO
/// - No failure mode (empty roles yield an empty set)
pub fn resolve_authorities(user: &User) -> AuthoritySet {
    resolve_role_authorities(&user.roles)
}

pub fn resolve_role_authorities(roles: &[Role]) -> AuthoritySet {
    let mut set = AuthoritySet::new();
    for role in roles {
        set.insert(role.authority());
        for permission in &role.permissions {
            set.insert(permission.as_str().to_string());
        }
    }
    set
}
