//! Password verification seam.
//!
//! The hashing algorithm is a deployment choice; the core only needs a
//! constant-time comparison of a plaintext candidate against a stored hash.

/// Verifies plaintext candidates against stored password hashes.
pub trait PasswordVerifier: Send + Sync {
    /// Returns `true` only when `candidate` matches `stored_hash`.
    ///
    /// Malformed hashes verify as `false`.
    fn verify(&self, candidate: &str, stored_hash: &str) -> bool;
}

impl<V> PasswordVerifier for std::sync::Arc<V>
where
    V: PasswordVerifier + ?Sized,
{
    fn verify(&self, candidate: &str, stored_hash: &str) -> bool {
        (**self).verify(candidate, stored_hash)
    }
}
