//! `pbac-core` — shared building blocks for the access-control backend.
//!
//! Pure types only: the structured error model and strongly-typed ids.

pub mod error;
pub mod id;

pub use error::{AuthError, AuthResult, ErrorKind};
pub use id::{InvalidId, SessionId, UserId};
