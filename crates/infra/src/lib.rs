//! Infrastructure layer: stores, password hashing, configuration and the
//! authentication service that ties them together.

pub mod auth_service;
pub mod config;
pub mod db;
pub mod error;
pub mod password;
pub mod seed;
pub mod session_store;
pub mod user_store;

pub use auth_service::{AuthService, BEARER_PREFIX, TokenPair, strip_bearer};
pub use config::{AppConfig, ConfigError};
pub use error::StoreError;
pub use password::Argon2PasswordVerifier;
pub use session_store::{InMemorySessionStore, PostgresSessionStore, SessionStore};
pub use user_store::{InMemoryUserStore, PostgresUserStore, UserStore};
