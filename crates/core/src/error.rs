//! Structured error model shared by every layer.
//!
//! Fallible operations return `AuthResult<T>`: either a value or exactly one
//! `AuthError`. The error carries a user-facing message, an internal cause and
//! a kind tag the transport boundary uses to pick a status code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the authentication core.
pub type AuthResult<T> = Result<T, AuthError>;

/// Error classification.
///
/// Serialized with the exact variant names so clients can branch on them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Entity not found or lookup failure.
    RepositoryError,
    /// Business rule violation (inactive account, wrong password).
    ServiceError,
    /// A token subject could not be read.
    NoUsernameInTokenError,
    /// Correctly signed token whose expiry has passed.
    ExpiredTokenError,
    /// Bad signature or malformed token.
    InvalidTokenError,
    /// Missing or malformed bearer credential.
    TokenNotFoundError,
    /// Authenticated identity lacks the required authority.
    AccessDenied,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::RepositoryError => "RepositoryError",
            ErrorKind::ServiceError => "ServiceError",
            ErrorKind::NoUsernameInTokenError => "NoUsernameInTokenError",
            ErrorKind::ExpiredTokenError => "ExpiredTokenError",
            ErrorKind::InvalidTokenError => "InvalidTokenError",
            ErrorKind::TokenNotFoundError => "TokenNotFoundError",
            ErrorKind::AccessDenied => "AccessDenied",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured failure.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message} ({cause})")]
#[serde(rename_all = "camelCase")]
pub struct AuthError {
    pub message: String,
    pub cause: String,
    #[serde(rename = "errorKind")]
    pub kind: ErrorKind,
}

impl AuthError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: cause.into(),
            kind,
        }
    }

    pub fn repository(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::RepositoryError, message, cause)
    }

    pub fn service(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceError, message, cause)
    }

    pub fn expired_token(cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExpiredTokenError, "The session has expired", cause)
    }

    pub fn invalid_token(cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidTokenError, "The token is not valid", cause)
    }

    pub fn no_username(cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoUsernameInTokenError, "The user does not exist", cause)
    }

    pub fn token_not_found(cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenNotFoundError, "No credentials were provided", cause)
    }

    pub fn access_denied(cause: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::AccessDenied,
            "You do not have the permissions required for this action",
            cause,
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_error_kind_tag() {
        let err = AuthError::repository("User bob does not exist", "User bob not found");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["message"], "User bob does not exist");
        assert_eq!(json["cause"], "User bob not found");
        assert_eq!(json["errorKind"], "RepositoryError");
    }

    #[test]
    fn display_includes_kind_and_cause() {
        let err = AuthError::expired_token("exp in the past");
        let rendered = err.to_string();
        assert!(rendered.starts_with("ExpiredTokenError"));
        assert!(rendered.contains("exp in the past"));
    }
}
