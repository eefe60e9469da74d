use std::sync::Arc;

use chrono::Duration;
use pbac_api::app::{AppServices, build_app};
use pbac_auth::{Permission, Role, TokenCodec, User};
use pbac_infra::Argon2PasswordVerifier;
use reqwest::StatusCode;
use serde_json::{Value, json};

const SECRET: &[u8] = b"black-box-test-secret-material";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(access_ttl: Duration) -> Self {
        let hasher = Argon2PasswordVerifier::with_params(8, 1, 1).unwrap();
        let users = [
            User::new("alice", "alice@example.com", hasher.hash_password("wonderland").unwrap())
                .with_roles([Role::new("ADMIN", [Permission::new("user_create")])]),
            User::new("bob", "bob@example.com", hasher.hash_password("builder").unwrap())
                .inactive(),
            User::new("carol", "carol@example.com", hasher.hash_password("pw").unwrap()),
        ];
        let codec = TokenCodec::from_secret(SECRET, access_ttl).unwrap();

        // Same router as prod, in-memory stores, ephemeral port.
        let app = build_app(Arc::new(AppServices::in_memory(codec, users)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api/v1", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn login(client: &reqwest::Client, srv: &TestServer, username: &str, password: &str) -> (StatusCode, Value) {
    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn login_ok(client: &reqwest::Client, srv: &TestServer, username: &str, password: &str) -> (String, String) {
    let (status, body) = login(client, srv, username, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    (
        body["ok"]["accessToken"].as_str().unwrap().to_string(),
        body["ok"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

async fn refresh(client: &reqwest::Client, srv: &TestServer, refresh_token: &str) -> (StatusCode, Value) {
    let res = client
        .post(srv.url("/auth/refresh_token"))
        .json(&json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn get(client: &reqwest::Client, url: String, token: Option<&str>) -> (StatusCode, Value) {
    let mut req = client.get(url);
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    let res = req.send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn health_is_outside_the_pipeline() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let health = srv.base_url.replace("/api/v1", "/health");

    let res = reqwest::Client::new()
        .get(health)
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_returns_token_pair_envelope() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let client = reqwest::Client::new();

    let (status, body) = login(&client, &srv, "alice", "wonderland").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["err"].is_null());
    let access = body["ok"]["accessToken"].as_str().unwrap();
    let refresh = body["ok"]["refreshToken"].as_str().unwrap();
    assert!(!access.is_empty());
    assert!(!refresh.is_empty());
    assert_ne!(access, refresh);
}

#[tokio::test]
async fn login_failures_carry_error_kinds() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let client = reqwest::Client::new();

    let (status, body) = login(&client, &srv, "nobody", "x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["ok"].is_null());
    assert_eq!(body["err"]["errorKind"], "RepositoryError");

    let (status, body) = login(&client, &srv, "bob", "builder").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["err"]["errorKind"], "ServiceError");

    let (status, body) = login(&client, &srv, "alice", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["err"]["errorKind"], "ServiceError");
}

#[tokio::test]
async fn refresh_rotates_and_rejects_replay() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let client = reqwest::Client::new();
    let (_, refresh_a) = login_ok(&client, &srv, "alice", "wonderland").await;

    let (status, body) = refresh(&client, &srv, &refresh_a).await;
    assert_eq!(status, StatusCode::OK);
    let refresh_b = body["ok"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(refresh_a, refresh_b);

    let (status, body) = refresh(&client, &srv, &refresh_a).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err"]["errorKind"], "RepositoryError");

    let (status, _) = refresh(&client, &srv, &refresh_b).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn expired_access_token_is_rejected_but_refresh_still_works() {
    let srv = TestServer::spawn(Duration::zero()).await;
    let client = reqwest::Client::new();
    let (access, refresh_token) = login_ok(&client, &srv, "alice", "wonderland").await;

    let (status, body) = get(&client, srv.url("/auth/authorities"), Some(&access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["err"]["errorKind"], "ExpiredTokenError");
    assert!(body["err"]["cause"].as_str().unwrap().contains("JWT has expired -> exp"));

    let (status, _) = refresh(&client, &srv, &refresh_token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn token_signed_with_another_key_is_invalid() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let client = reqwest::Client::new();
    let forger = TokenCodec::from_secret(b"not-the-server-key", Duration::minutes(15)).unwrap();
    let forged = forger.issue_access_token("alice").unwrap();

    let (status, body) = get(&client, srv.url("/auth/authorities"), Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["err"]["errorKind"], "InvalidTokenError");
}

#[tokio::test]
async fn token_without_subject_is_rejected_by_pipeline() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let client = reqwest::Client::new();
    let codec = TokenCodec::from_secret(SECRET, Duration::minutes(15)).unwrap();
    let anonymous = codec.issue_access_token("").unwrap();

    let (status, body) = get(&client, srv.url("/auth/authorities"), Some(&anonymous)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["ok"].is_null());
    assert_eq!(body["err"]["errorKind"], "NoUsernameInTokenError");
}

#[tokio::test]
async fn token_for_unknown_user_is_rejected_by_pipeline() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let client = reqwest::Client::new();
    let codec = TokenCodec::from_secret(SECRET, Duration::minutes(15)).unwrap();
    let ghost = codec.issue_access_token("ghost").unwrap();

    let (status, body) = get(&client, srv.url("/auth/authorities"), Some(&ghost)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["err"]["errorKind"], "RepositoryError");
}

#[tokio::test]
async fn authorities_reflect_roles_and_permissions() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let client = reqwest::Client::new();

    let (access, _) = login_ok(&client, &srv, "alice", "wonderland").await;
    let (status, body) = get(&client, srv.url("/auth/authorities"), Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(["ROLE_ADMIN", "user_create"]));

    let (access, _) = login_ok(&client, &srv, "carol", "pw").await;
    let (status, body) = get(&client, srv.url("/auth/authorities"), Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!([]));
}

#[tokio::test]
async fn authorities_without_credentials_is_unauthorized() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let (status, body) = get(&reqwest::Client::new(), srv.url("/auth/authorities"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["err"]["errorKind"], "AccessDenied");
}

#[tokio::test]
async fn authorize_checks_flattened_permissions() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let client = reqwest::Client::new();
    let (alice, _) = login_ok(&client, &srv, "alice", "wonderland").await;
    let (carol, _) = login_ok(&client, &srv, "carol", "pw").await;

    let (status, body) = get(&client, srv.url("/auth/authorize?permission=user_create"), Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = get(&client, srv.url("/auth/authorize?permission=user_delete"), Some(&alice)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["err"]["errorKind"], "AccessDenied");

    let (status, _) = get(&client, srv.url("/auth/authorize?permission=user_create"), Some(&carol)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn is_authorized_checks_role_names() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let client = reqwest::Client::new();
    let (access, _) = login_ok(&client, &srv, "alice", "wonderland").await;

    let (status, body) = get(&client, srv.url("/auth/is_authorized?role=ADMIN"), Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (_, body) = get(&client, srv.url("/auth/is_authorized?role=user_create"), Some(&access)).await;
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn identity_route_returns_summary() {
    let srv = TestServer::spawn(Duration::minutes(15)).await;
    let client = reqwest::Client::new();
    let (access, _) = login_ok(&client, &srv, "alice", "wonderland").await;

    let (status, body) = get(&client, srv.url("/auth/user"), Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"]["username"], "alice");
    assert_eq!(body["ok"]["email"], "alice@example.com");
    assert!(body["ok"]["id"].is_string());

    let (status, body) = get(&client, srv.url("/auth/user"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["err"]["errorKind"], "TokenNotFoundError");
}
