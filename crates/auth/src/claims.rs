use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access-token claims.
///
/// The token carries identity and lifetime only; authorities are recomputed
/// from the store on every validated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (username).
    pub sub: String,

    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,

    /// Expiration, seconds since the Unix epoch.
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(subject: impl Into<String>, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: subject.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// A token is expired once `now` reaches its expiration instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
