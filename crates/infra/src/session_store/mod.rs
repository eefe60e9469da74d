//! Session persistence and refresh-token rotation.
//!
//! Sessions are keyed by a surrogate `SessionId`; the refresh token is a
//! unique attribute looked up through an index and replaced in place.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemorySessionStore;
pub use postgres::PostgresSessionStore;
pub use r#trait::SessionStore;
