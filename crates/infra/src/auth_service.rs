//! Login, refresh and token-derived identity queries.
//!
//! Every entry point returns `AuthResult`; store failures are folded into
//! `RepositoryError` before they leave this module.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pbac_auth::{PasswordVerifier, Principal, TokenCodec, TokenOutcome, User, UserSummary};
use pbac_core::{AuthError, AuthResult};

use crate::error::StoreError;
use crate::session_store::SessionStore;
use crate::user_store::UserStore;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Access/refresh pair handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Strip the `Bearer ` prefix from an Authorization header value.
pub fn strip_bearer(header: &str) -> AuthResult<&str> {
    match header.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::token_not_found(
            "Authorization header is not a bearer credential",
        )),
    }
}

fn user_not_found(cause: impl Into<String>) -> AuthError {
    AuthError::repository("The user was not found", cause)
}

fn compromised(detail: impl std::fmt::Display) -> AuthError {
    user_not_found(format!(
        "The token is compromised / modified and is not valid: {detail}"
    ))
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    passwords: Arc<dyn PasswordVerifier>,
    codec: TokenCodec,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        passwords: Arc<dyn PasswordVerifier>,
        codec: TokenCodec,
    ) -> Self {
        Self {
            users,
            sessions,
            passwords,
            codec,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    async fn find_user(&self, username: &str) -> AuthResult<Option<User>> {
        Ok(self.users.find_by_username(username).await?)
    }

    /// Subject of a token whether or not it has expired.
    fn subject_of(&self, token: &str) -> AuthResult<String> {
        match self.codec.extract_subject(token) {
            TokenOutcome::Valid(subject) | TokenOutcome::Expired { claim: subject, .. } => {
                Ok(subject)
            }
            TokenOutcome::Invalid(error) => Err(error),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Login / refresh
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn login(&self, username: &str, password: &str) -> AuthResult<TokenPair> {
        let Some(user) = self.find_user(username).await? else {
            warn!(username, "login for unknown user");
            return Err(AuthError::repository(
                format!("User {username} does not exist"),
                format!("User {username} not found"),
            ));
        };

        if !user.is_active() {
            warn!(username, "login for inactive user");
            return Err(AuthError::service("The user is not active", "User is not active"));
        }

        if !self.passwords.verify(password, &user.password_hash) {
            warn!(username, "login with wrong password");
            return Err(AuthError::service("Incorrect password", "Passwords do not match"));
        }

        let access_token = self.codec.issue_access_token(&user.username)?;
        let refresh_token = self.codec.issue_refresh_token();

        // A freshly minted refresh token matches no row, so this always inserts.
        let session = self
            .sessions
            .upsert(&access_token, &refresh_token, &refresh_token)
            .await?;

        info!(username, session_id = %session.id, "login succeeded");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let Some(session) = self.sessions.find_by_refresh_token(refresh_token).await? else {
            warn!("refresh with unknown refresh token");
            return Err(AuthError::repository(
                "There is no valid session",
                "No session matches the provided refresh token",
            ));
        };

        let subject = match self.subject_of(&session.access_token) {
            Ok(subject) => subject,
            Err(error) => {
                warn!(session_id = %session.id, kind = %error.kind(), "stored access token unreadable");
                return Err(compromised(error.cause));
            }
        };

        let Some(user) = self.find_user(&subject).await? else {
            warn!(session_id = %session.id, subject, "refresh for vanished user");
            return Err(user_not_found(
                "No user matches the subject of the stored access token",
            ));
        };

        if let Err(error) = self.codec.is_token_valid(&session.access_token, &user.username) {
            warn!(session_id = %session.id, username = %user.username, "refresh rejected as tampered");
            return Err(compromised(error.cause));
        }

        let access_token = self.codec.issue_access_token(&user.username)?;
        let new_refresh_token = self.codec.issue_refresh_token();

        // Rotate directly: a concurrent refresh that already consumed this
        // token leaves zero matching rows and must fail, not insert.
        let rotated = self
            .sessions
            .rotate(refresh_token, &access_token, &new_refresh_token)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => {
                    warn!(session_id = %session.id, "refresh lost the rotation race");
                    AuthError::repository(
                        "There is no valid session",
                        format!("Session was rotated concurrently: {e}"),
                    )
                }
                other => AuthError::from(other),
            })?;

        info!(username = %user.username, session_id = %rotated.id, "session rotated");
        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh_token,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Token-derived queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve the `{id, username, email}` projection of the bearer's user.
    pub async fn identity_from_access_token(&self, bearer: &str) -> AuthResult<UserSummary> {
        let token = strip_bearer(bearer)?;
        let subject = self.subject_of(token)?;

        self.find_user(&subject)
            .await?
            .map(|user| user.summary())
            .ok_or_else(|| user_not_found("No user matches the token claims"))
    }

    /// Coarse role check by role name on the bearer's user.
    pub async fn is_authorized(&self, bearer: &str, role_name: &str) -> AuthResult<bool> {
        let token = strip_bearer(bearer)?;
        let subject = self.subject_of(token)?;

        let user = self
            .find_user(&subject)
            .await?
            .ok_or_else(|| user_not_found("No user matches the token claims"))?;

        Ok(user.has_role_named(role_name))
    }

    /// Load `username` and build its principal (summary + authority set).
    pub async fn principal_for(&self, username: &str) -> AuthResult<Principal> {
        self.find_user(username)
            .await?
            .map(|user| Principal::from_user(&user))
            .ok_or_else(|| user_not_found(format!("User {username} not found")))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Duration;

    use pbac_auth::{Permission, Role, Session};
    use pbac_core::ErrorKind;

    use super::*;
    use crate::session_store::InMemorySessionStore;
    use crate::user_store::InMemoryUserStore;

    const SECRET: &[u8] = b"auth-service-test-secret-material";

    /// Stores the plaintext as the "hash".
    struct PlainVerifier;

    impl PasswordVerifier for PlainVerifier {
        fn verify(&self, candidate: &str, stored_hash: &str) -> bool {
            candidate == stored_hash
        }
    }

    struct Fixture {
        service: AuthService,
        users: Arc<InMemoryUserStore>,
        sessions: Arc<InMemorySessionStore>,
    }

    fn fixture_with_ttl(ttl: Duration) -> Fixture {
        let users = Arc::new(InMemoryUserStore::with_users([
            User::new("alice", "alice@example.com", "wonderland").with_roles([Role::new(
                "ADMIN",
                [Permission::new("user_create")],
            )]),
            User::new("bob", "bob@example.com", "builder").inactive(),
        ]));
        let sessions = Arc::new(InMemorySessionStore::new());
        let service = AuthService::new(
            users.clone(),
            sessions.clone(),
            Arc::new(PlainVerifier),
            TokenCodec::from_secret(SECRET, ttl).unwrap(),
        );
        Fixture {
            service,
            users,
            sessions,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_ttl(Duration::minutes(15))
    }

    #[tokio::test]
    async fn login_issues_distinct_tokens_and_persists_session() {
        let f = fixture();
        let pair = f.service.login("alice", "wonderland").await.unwrap();

        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        assert_ne!(pair.access_token, pair.refresh_token);

        let session = f
            .sessions
            .find_by_refresh_token(&pair.refresh_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.access_token, pair.access_token);
    }

    #[tokio::test]
    async fn login_unknown_user_is_repository_error() {
        let err = fixture().service.login("nobody", "x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RepositoryError);
    }

    #[tokio::test]
    async fn login_inactive_user_is_service_error_regardless_of_password() {
        let f = fixture();
        for password in ["builder", "wrong"] {
            let err = f.service.login("bob", password).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ServiceError);
            assert_eq!(err.cause, "User is not active");
        }
        assert!(f.sessions.is_empty());
    }

    #[tokio::test]
    async fn login_wrong_password_is_service_error() {
        let f = fixture();
        let err = f.service.login("alice", "not-it").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceError);
        assert_eq!(err.cause, "Passwords do not match");
        assert!(f.sessions.is_empty());
    }

    #[tokio::test]
    async fn refresh_rotates_and_stale_token_cannot_be_replayed() {
        let f = fixture();
        let first = f.service.login("alice", "wonderland").await.unwrap();

        let second = f.service.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(f.sessions.len(), 1);

        let replay = f.service.refresh(&first.refresh_token).await.unwrap_err();
        assert_eq!(replay.kind(), ErrorKind::RepositoryError);

        // The rotated token keeps working.
        f.service.refresh(&second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_works_after_access_token_expired() {
        let f = fixture_with_ttl(Duration::zero());
        let pair = f.service.login("alice", "wonderland").await.unwrap();

        assert!(f.service.codec().decode(&pair.access_token).is_expired());
        let rotated = f.service.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);
    }

    #[tokio::test]
    async fn refresh_unknown_token_is_repository_error() {
        let err = fixture().service.refresh("no-such-token").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RepositoryError);
        assert_eq!(err.cause, "No session matches the provided refresh token");
    }

    #[tokio::test]
    async fn refresh_for_deleted_user_is_repository_error() {
        let f = fixture();
        let ghost = f.service.codec().issue_access_token("ghost").unwrap();
        f.sessions
            .insert(Session::new(ghost, "refresh-ghost", chrono::Utc::now()))
            .await
            .unwrap();

        let err = f.service.refresh("refresh-ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RepositoryError);
        assert!(!err.cause.contains("compromised"));
    }

    #[tokio::test]
    async fn refresh_with_forged_stored_token_reports_compromise() {
        let f = fixture();
        let forger =
            TokenCodec::from_secret(b"someone-elses-key-material", Duration::minutes(5)).unwrap();
        let forged = forger.issue_access_token("alice").unwrap();
        f.sessions
            .insert(Session::new(forged, "refresh-forged", chrono::Utc::now()))
            .await
            .unwrap();

        let err = f.service.refresh("refresh-forged").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RepositoryError);
        assert!(err.cause.contains("compromised"));
        assert!(f.sessions.find_by_refresh_token("refresh-forged").await.unwrap().is_some());
    }

    /// Resolves usernames case-insensitively, handing back the stored spelling.
    struct CaseFoldingUserStore(InMemoryUserStore);

    #[async_trait]
    impl UserStore for CaseFoldingUserStore {
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            self.0.find_by_username(&username.to_lowercase()).await
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.0.find_by_email(email).await
        }

        async fn insert(&self, user: User) -> Result<User, StoreError> {
            self.0.insert(user).await
        }

        async fn set_active(&self, username: &str, active: bool) -> Result<(), StoreError> {
            self.0.set_active(username, active).await
        }
    }

    #[tokio::test]
    async fn refresh_with_subject_not_matching_resolved_user_reports_compromise() {
        let users = CaseFoldingUserStore(InMemoryUserStore::with_users([User::new(
            "alice",
            "alice@example.com",
            "wonderland",
        )]));
        let sessions = Arc::new(InMemorySessionStore::new());
        let service = AuthService::new(
            Arc::new(users),
            sessions.clone(),
            Arc::new(PlainVerifier),
            TokenCodec::from_secret(SECRET, Duration::minutes(15)).unwrap(),
        );

        let stored = service.codec().issue_access_token("ALICE").unwrap();
        sessions
            .insert(Session::new(stored, "refresh-upper", chrono::Utc::now()))
            .await
            .unwrap();

        let err = service.refresh("refresh-upper").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RepositoryError);
        assert!(err.cause.contains("compromised"));
        assert!(err.cause.contains("'ALICE'"));
        assert!(sessions.find_by_refresh_token("refresh-upper").await.unwrap().is_some());
    }

    /// Session store whose rotation always fails with the given error.
    struct FailingRotation(InMemorySessionStore, StoreError);

    #[async_trait]
    impl SessionStore for FailingRotation {
        async fn find_by_refresh_token(
            &self,
            refresh_token: &str,
        ) -> Result<Option<Session>, StoreError> {
            self.0.find_by_refresh_token(refresh_token).await
        }

        async fn insert(&self, session: Session) -> Result<Session, StoreError> {
            self.0.insert(session).await
        }

        async fn rotate(&self, _: &str, _: &str, _: &str) -> Result<Session, StoreError> {
            Err(self.1.clone())
        }
    }

    async fn refresh_with_failing_rotation(failure: StoreError) -> AuthError {
        let codec = TokenCodec::from_secret(SECRET, Duration::minutes(15)).unwrap();
        let sessions = FailingRotation(InMemorySessionStore::new(), failure);
        sessions
            .insert(Session::new(
                codec.issue_access_token("alice").unwrap(),
                "refresh-1",
                chrono::Utc::now(),
            ))
            .await
            .unwrap();
        let service = AuthService::new(
            Arc::new(InMemoryUserStore::with_users([User::new(
                "alice",
                "alice@example.com",
                "wonderland",
            )])),
            Arc::new(sessions),
            Arc::new(PlainVerifier),
            codec,
        );

        service.refresh("refresh-1").await.unwrap_err()
    }

    #[tokio::test]
    async fn rotation_matching_no_row_is_reported_as_concurrent_rotation() {
        let err = refresh_with_failing_rotation(StoreError::not_found("no row")).await;
        assert_eq!(err.kind(), ErrorKind::RepositoryError);
        assert!(err.cause.contains("rotated concurrently"));
    }

    #[tokio::test]
    async fn backend_failure_during_rotation_is_not_reported_as_a_race() {
        let err = refresh_with_failing_rotation(StoreError::backend("pool closed")).await;
        assert_eq!(err.kind(), ErrorKind::RepositoryError);
        assert!(err.cause.contains("pool closed"));
        assert!(!err.cause.contains("rotated concurrently"));
    }

    #[tokio::test]
    async fn concurrent_refreshes_of_one_token_succeed_at_most_once() {
        let f = fixture();
        let pair = f.service.login("alice", "wonderland").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = f.service.clone();
            let token = pair.refresh_token.clone();
            handles.push(tokio::spawn(async move { service.refresh(&token).await }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(err) => assert_eq!(err.kind(), ErrorKind::RepositoryError),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(f.sessions.len(), 1);
    }

    #[tokio::test]
    async fn identity_projection_from_bearer() {
        let f = fixture();
        let pair = f.service.login("alice", "wonderland").await.unwrap();

        let identity = f
            .service
            .identity_from_access_token(&format!("Bearer {}", pair.access_token))
            .await
            .unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.email, "alice@example.com");
    }

    #[tokio::test]
    async fn identity_requires_bearer_prefix_and_existing_user() {
        let f = fixture();
        let pair = f.service.login("alice", "wonderland").await.unwrap();

        let err = f
            .service
            .identity_from_access_token(&pair.access_token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenNotFoundError);

        let ghost = f.service.codec().issue_access_token("ghost").unwrap();
        let err = f
            .service
            .identity_from_access_token(&format!("Bearer {ghost}"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RepositoryError);
    }

    #[tokio::test]
    async fn is_authorized_checks_role_names_only() {
        let f = fixture();
        let pair = f.service.login("alice", "wonderland").await.unwrap();
        let bearer = format!("Bearer {}", pair.access_token);

        assert!(f.service.is_authorized(&bearer, "ADMIN").await.unwrap());
        assert!(!f.service.is_authorized(&bearer, "user_create").await.unwrap());
        assert!(!f.service.is_authorized(&bearer, "SUPERADMIN").await.unwrap());
    }

    #[tokio::test]
    async fn principal_reflects_current_role_graph() {
        let f = fixture();
        let principal = f.service.principal_for("alice").await.unwrap();

        let authorities: Vec<&str> = principal.authorities.iter().collect();
        assert_eq!(authorities, vec!["ROLE_ADMIN", "user_create"]);

        f.users.set_active("alice", false).await.unwrap();
        assert!(f.service.principal_for("alice").await.is_ok());
        assert_eq!(
            f.service.principal_for("ghost").await.unwrap_err().kind(),
            ErrorKind::RepositoryError
        );
    }

    #[test]
    fn token_pair_serializes_camel_case() {
        let pair = TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
    }

    #[test]
    fn strip_bearer_rejects_other_schemes() {
        assert_eq!(strip_bearer("Bearer abc").unwrap(), "abc");
        assert!(strip_bearer("Basic abc").is_err());
        assert!(strip_bearer("Bearer ").is_err());
    }
}
