//! `pbac-auth` — pure authentication/authorization model.
//!
//! Token codec, authority derivation and authorization checks. No storage and
//! no transport: stores live in `pbac-infra`, HTTP in `pbac-api`.

pub mod authority;
pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod session;
pub mod token;
pub mod user;

pub use authority::{AuthoritySet, resolve_authorities, resolve_role_authorities};
pub use authorize::{authorize, require_role};
pub use claims::AccessClaims;
pub use password::PasswordVerifier;
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::{ROLE_PREFIX, Role};
pub use session::Session;
pub use token::{TokenCodec, TokenConfigError, TokenOutcome};
pub use user::{User, UserSummary};
