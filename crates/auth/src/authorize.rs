//! Downstream authorization checks against an installed principal.
//!
//! Two independent paths exist: fine-grained authority checks against the
//! flattened set, and coarse role checks. They are not assumed equivalent.

use pbac_core::{AuthError, AuthResult};

use crate::{Permission, Principal};

/// Require a permission (or any authority string) from the principal.
///
/// - No IO
/// - No panics
pub fn authorize(principal: &Principal, required: &Permission) -> AuthResult<()> {
    if principal.authorities.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthError::access_denied(format!(
            "Access Denied: user '{}' lacks authority '{}'",
            principal.username(),
            required
        )))
    }
}

/// Require a role, checked through its `ROLE_` authority.
pub fn require_role(principal: &Principal, role_name: &str) -> AuthResult<()> {
    if principal.authorities.has_role(role_name) {
        Ok(())
    } else {
        Err(AuthError::access_denied(format!(
            "Access Denied: user '{}' lacks role '{}'",
            principal.username(),
            role_name
        )))
    }
}
