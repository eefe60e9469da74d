//! Access/refresh token codec.
//!
//! Access tokens are HS256-signed JWTs carrying `sub`, `iat` and `exp`.
//! Refresh tokens are opaque random UUIDs with no embedded claims.
//!
//! Parsing separates three outcomes:
//!
//! ```text
//! bad signature / malformed   -> TokenOutcome::Invalid(InvalidTokenError)
//! signed, past expiry         -> TokenOutcome::Expired { claim, ExpiredTokenError }
//! signed, within lifetime     -> TokenOutcome::Valid(claim)
//! ```
//!
//! An expired token still yields its claims. Callers that need the subject of
//! an expired token (session refresh) read it from `Expired`, while callers
//! that authenticate a request treat `Expired` as a distinct rejection.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use pbac_core::{AuthError, AuthResult};

use crate::AccessClaims;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Result of parsing a token: an optional claim paired with an optional error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome<T> {
    /// Signature verified and the token is within its lifetime.
    Valid(T),
    /// Signature verified but the token has expired; the claim is still available.
    Expired { claim: T, error: AuthError },
    /// The token could not be trusted; no claim is available.
    Invalid(AuthError),
}

impl<T> TokenOutcome<T> {
    pub fn claim(&self) -> Option<&T> {
        match self {
            TokenOutcome::Valid(claim) | TokenOutcome::Expired { claim, .. } => Some(claim),
            TokenOutcome::Invalid(_) => None,
        }
    }

    pub fn error(&self) -> Option<&AuthError> {
        match self {
            TokenOutcome::Valid(_) => None,
            TokenOutcome::Expired { error, .. } | TokenOutcome::Invalid(error) => Some(error),
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, TokenOutcome::Expired { .. })
    }

    pub fn into_claim(self) -> Option<T> {
        self.into_parts().0
    }

    pub fn into_parts(self) -> (Option<T>, Option<AuthError>) {
        match self {
            TokenOutcome::Valid(claim) => (Some(claim), None),
            TokenOutcome::Expired { claim, error } => (Some(claim), Some(error)),
            TokenOutcome::Invalid(error) => (None, Some(error)),
        }
    }

    /// Strict view: expired tokens become errors.
    pub fn into_result(self) -> AuthResult<T> {
        match self {
            TokenOutcome::Valid(claim) => Ok(claim),
            TokenOutcome::Expired { error, .. } | TokenOutcome::Invalid(error) => Err(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TokenOutcome<U> {
        match self {
            TokenOutcome::Valid(claim) => TokenOutcome::Valid(f(claim)),
            TokenOutcome::Expired { claim, error } => TokenOutcome::Expired {
                claim: f(claim),
                error,
            },
            TokenOutcome::Invalid(error) => TokenOutcome::Invalid(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenConfigError {
    #[error("signing secret is not valid base64: {0}")]
    InvalidSecret(String),

    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("access token lifetime must not be negative")]
    NegativeTtl,
}

/// Signs and parses access tokens, mints refresh tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("access_ttl", &self.access_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from raw HMAC key material.
    pub fn from_secret(secret: &[u8], access_ttl: Duration) -> Result<Self, TokenConfigError> {
        if secret.is_empty() {
            return Err(TokenConfigError::EmptySecret);
        }
        if access_ttl < Duration::zero() {
            return Err(TokenConfigError::NegativeTtl);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
        })
    }

    /// Build a codec from base64-encoded key material (the configured form).
    pub fn from_base64_secret(secret: &str, access_ttl: Duration) -> Result<Self, TokenConfigError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(TokenConfigError::EmptySecret);
        }
        if access_ttl < Duration::zero() {
            return Err(TokenConfigError::NegativeTtl);
        }

        let encoding = EncodingKey::from_base64_secret(secret)
            .map_err(|e| TokenConfigError::InvalidSecret(e.to_string()))?;
        let decoding = DecodingKey::from_base64_secret(secret)
            .map_err(|e| TokenConfigError::InvalidSecret(e.to_string()))?;

        Ok(Self {
            encoding,
            decoding,
            access_ttl,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────────────

    pub fn issue_access_token(&self, subject: &str) -> AuthResult<String> {
        self.issue_access_token_at(subject, Utc::now())
    }

    pub fn issue_access_token_at(&self, subject: &str, now: DateTime<Utc>) -> AuthResult<String> {
        let expires_at = now + self.access_ttl;
        let claims = AccessClaims::new(subject, now, expires_at);

        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| {
                AuthError::service(
                    "Could not issue credentials",
                    format!("JWT signing failed -> {e}"),
                )
            })?;

        tracing::info!(subject, %expires_at, "issued access token");
        Ok(token)
    }

    /// Fresh opaque refresh token (random 128-bit UUID).
    pub fn issue_refresh_token(&self) -> String {
        let token = Uuid::new_v4().to_string();
        tracing::debug!("issued refresh token");
        token
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Parsing
    // ─────────────────────────────────────────────────────────────────────────

    pub fn decode(&self, token: &str) -> TokenOutcome<AccessClaims> {
        self.decode_at(token, Utc::now())
    }

    /// Verify the signature and classify expiry relative to `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> TokenOutcome<AccessClaims> {
        // Expiry is classified here rather than by the library so the claims
        // of an expired token stay readable.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        let claims = match jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                return TokenOutcome::Invalid(AuthError::invalid_token(format!(
                    "JWT rejected -> {e}"
                )));
            }
        };

        if claims.is_expired_at(now) {
            let error = AuthError::expired_token(format!(
                "JWT has expired -> exp {} <= now {}",
                claims.exp,
                now.timestamp()
            ));
            TokenOutcome::Expired { claim: claims, error }
        } else {
            TokenOutcome::Valid(claims)
        }
    }

    /// Subject of a correctly signed token, expired or not.
    ///
    /// An empty subject is reported as `NoUsernameInTokenError`.
    pub fn extract_subject(&self, token: &str) -> TokenOutcome<String> {
        self.extract_subject_at(token, Utc::now())
    }

    pub fn extract_subject_at(&self, token: &str, now: DateTime<Utc>) -> TokenOutcome<String> {
        match self.decode_at(token, now).map(|c| c.sub) {
            TokenOutcome::Valid(sub) | TokenOutcome::Expired { claim: sub, .. }
                if sub.trim().is_empty() =>
            {
                TokenOutcome::Invalid(AuthError::no_username("token carries no subject"))
            }
            other => other,
        }
    }

    /// Whether the token has expired.
    ///
    /// For an expired token this yields `Expired { claim: true, .. }`: the
    /// comparison result is still reported alongside the expiry error.
    pub fn is_expired(&self, token: &str) -> TokenOutcome<bool> {
        self.is_expired_at(token, Utc::now())
    }

    pub fn is_expired_at(&self, token: &str, now: DateTime<Utc>) -> TokenOutcome<bool> {
        self.decode_at(token, now).map(|c| c.is_expired_at(now))
    }

    /// Check that the token's subject is `username`.
    ///
    /// Expiry is not part of this check.
    pub fn is_token_valid(&self, token: &str, username: &str) -> AuthResult<()> {
        let subject = match self.extract_subject(token) {
            TokenOutcome::Valid(sub) | TokenOutcome::Expired { claim: sub, .. } => sub,
            TokenOutcome::Invalid(error) => return Err(error),
        };

        if subject == username {
            Ok(())
        } else {
            tracing::warn!(subject, username, "token subject does not match resolved user");
            Err(AuthError::invalid_token(format!(
                "token subject '{subject}' does not match user '{username}'"
            )))
        }
    }
}
