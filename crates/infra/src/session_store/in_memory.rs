use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use pbac_auth::Session;
use pbac_core::SessionId;

use super::r#trait::SessionStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Sessions {
    rows: HashMap<SessionId, Session>,
    by_refresh_token: HashMap<String, SessionId>,
}

/// In-memory session store (arena + refresh-token index).
///
/// Intended for tests/dev. A single write lock makes `rotate()` atomic.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<Sessions>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of session rows (including orphaned ones).
    pub fn len(&self) -> usize {
        self.inner.read().map(|s| s.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::backend("session store lock poisoned")
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, StoreError> {
        let sessions = self.inner.read().map_err(|_| poisoned())?;
        Ok(sessions
            .by_refresh_token
            .get(refresh_token)
            .and_then(|id| sessions.rows.get(id))
            .cloned())
    }

    async fn insert(&self, session: Session) -> Result<Session, StoreError> {
        let mut sessions = self.inner.write().map_err(|_| poisoned())?;

        if sessions.by_refresh_token.contains_key(&session.refresh_token) {
            return Err(StoreError::conflict("refresh token already bound to a session"));
        }

        sessions
            .by_refresh_token
            .insert(session.refresh_token.clone(), session.id);
        sessions.rows.insert(session.id, session.clone());
        Ok(session)
    }

    async fn rotate(
        &self,
        old_refresh_token: &str,
        new_access_token: &str,
        new_refresh_token: &str,
    ) -> Result<Session, StoreError> {
        let mut sessions = self.inner.write().map_err(|_| poisoned())?;

        let id = *sessions
            .by_refresh_token
            .get(old_refresh_token)
            .ok_or_else(|| StoreError::not_found("no session matches the refresh token"))?;

        if old_refresh_token != new_refresh_token
            && sessions.by_refresh_token.contains_key(new_refresh_token)
        {
            return Err(StoreError::conflict("refresh token already bound to a session"));
        }

        let row = sessions
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::backend("session index points at a missing row"))?;
        row.rotate(new_access_token, new_refresh_token, Utc::now());
        let rotated = row.clone();

        sessions.by_refresh_token.remove(old_refresh_token);
        sessions
            .by_refresh_token
            .insert(new_refresh_token.to_string(), id);

        Ok(rotated)
    }
}
