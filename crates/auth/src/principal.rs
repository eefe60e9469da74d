use serde::Serialize;

use crate::{AuthoritySet, User, UserSummary, resolve_authorities};

/// An authenticated identity together with its current authorities.
///
/// Built per request from the store, never from token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user: UserSummary,
    pub authorities: AuthoritySet,
}

impl Principal {
    pub fn from_user(user: &User) -> Self {
        Self {
            user: user.summary(),
            authorities: resolve_authorities(user),
        }
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }
}
