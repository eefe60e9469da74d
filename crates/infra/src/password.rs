//! Argon2 password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tracing::debug;

use pbac_auth::PasswordVerifier;
use pbac_core::{AuthError, AuthResult};

/// Argon2id hasher/verifier working on PHC strings (`$argon2id$v=19$...`).
#[derive(Clone)]
pub struct Argon2PasswordVerifier {
    argon2: Argon2<'static>,
}

impl Argon2PasswordVerifier {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Custom cost parameters (memory KiB, iterations, parallelism).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> AuthResult<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None).map_err(|e| {
            AuthError::service("Password hashing is misconfigured", e.to_string())
        })?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::service("Password could not be hashed", e.to_string()))?;
        Ok(hash.to_string())
    }
}

impl Default for Argon2PasswordVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Argon2PasswordVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2PasswordVerifier").finish_non_exhaustive()
    }
}

impl PasswordVerifier for Argon2PasswordVerifier {
    fn verify(&self, candidate: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "stored password hash is not a PHC string");
                return false;
            }
        };
        argon2::PasswordVerifier::verify_password(&self.argon2, candidate.as_bytes(), &parsed)
            .is_ok()
    }
}
