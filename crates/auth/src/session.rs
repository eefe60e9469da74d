//! Server-side session record pairing one refresh token with one access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pbac_core::SessionId;

/// A session row.
///
/// `id` is a stable surrogate key. `refresh_token` is unique across all rows
/// and is replaced in place on every rotation together with `access_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub refresh_token: String,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub rotated_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            refresh_token: refresh_token.into(),
            access_token: access_token.into(),
            created_at: now,
            rotated_at: None,
        }
    }

    /// Replace both token values, keeping the surrogate id.
    pub fn rotate(
        &mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.access_token = access_token.into();
        self.refresh_token = refresh_token.into();
        self.rotated_at = Some(now);
    }
}
