//! Store-level errors and their mapping onto the structured error model.
//!
//! | SQLx error                        | Postgres code | StoreError |
//! |-----------------------------------|---------------|------------|
//! | Database (unique violation)       | `23505`       | `Conflict` |
//! | RowNotFound                       | N/A           | `NotFound` |
//! | anything else (pool, IO, decode)  | any           | `Backend`  |

use thiserror::Error;

use pbac_core::AuthError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No row matched the lookup or conditional update.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend failed (connection, lock poisoning, decoding).
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        let message = match &value {
            StoreError::NotFound(_) => "The requested record does not exist",
            StoreError::Conflict(_) => "The record already exists",
            StoreError::Backend(_) => "The record could not be read or written",
        };
        AuthError::repository(message, value.to_string())
    }
}

/// Map a SQLx error onto `StoreError`, tagging it with the failing operation.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::not_found(format!("{operation}: row not found")),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::conflict(format!("{operation}: {}", db.message()))
        }
        _ => StoreError::backend(format!("{operation}: {err}")),
    }
}
