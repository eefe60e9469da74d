use std::sync::RwLock;

use async_trait::async_trait;

use pbac_auth::User;

use super::r#trait::UserStore;
use crate::error::StoreError;

/// In-memory user store (dev/test only).
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().collect()),
        }
    }

    fn find_by(&self, pred: impl Fn(&User) -> bool) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| pred(u)).cloned())
    }
}

fn poisoned() -> StoreError {
    StoreError::backend("user store lock poisoned")
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_by(|u| u.username == username)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_by(|u| u.email == email)
    }

    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::conflict(format!("username {} is taken", user.username)));
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::conflict(format!("email {} is taken", user.email)));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn set_active(&self, username: &str, active: bool) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        let user = users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| StoreError::not_found(format!("user {username}")))?;
        user.active = active;
        Ok(())
    }
}
