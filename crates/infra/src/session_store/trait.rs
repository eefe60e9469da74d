use async_trait::async_trait;
use chrono::Utc;

use pbac_auth::Session;

use crate::error::StoreError;

/// Relational session store with atomic rotation.
///
/// ## Rotation Semantics
///
/// `rotate()` is a single conditional update: it rewrites the access token
/// and the refresh token of the row currently holding `old_refresh_token`.
/// When no row holds it the call fails with `StoreError::NotFound`, so two
/// concurrent rotations of the same token cannot both succeed.
///
/// Implementations must:
/// - keep `refresh_token` unique across rows (`StoreError::Conflict` otherwise)
/// - perform `rotate()` as one atomic step (no read-then-write)
/// - never delete rows (orphaned sessions are left for an external reaper)
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Point lookup by the current refresh token.
    async fn find_by_refresh_token(&self, refresh_token: &str)
    -> Result<Option<Session>, StoreError>;

    /// Insert a brand-new session row.
    async fn insert(&self, session: Session) -> Result<Session, StoreError>;

    /// Atomically replace both tokens of the row keyed by `old_refresh_token`.
    async fn rotate(
        &self,
        old_refresh_token: &str,
        new_access_token: &str,
        new_refresh_token: &str,
    ) -> Result<Session, StoreError>;

    /// Rotate the row matching `match_old_refresh_token`, or insert a new row
    /// keyed by `new_refresh_token` when nothing matches.
    async fn upsert(
        &self,
        new_access_token: &str,
        new_refresh_token: &str,
        match_old_refresh_token: &str,
    ) -> Result<Session, StoreError> {
        match self
            .rotate(match_old_refresh_token, new_access_token, new_refresh_token)
            .await
        {
            Err(StoreError::NotFound(_)) => {
                self.insert(Session::new(new_access_token, new_refresh_token, Utc::now()))
                    .await
            }
            other => other,
        }
    }
}
