//! Authentication endpoints.
//!
//! `login` and `refresh_token` are skipped by the pipeline; the others see
//! whatever identity the pipeline installed.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::{HeaderMap, header::AUTHORIZATION},
    routing::{get, post},
};

use pbac_auth::{AuthoritySet, Permission, UserSummary, authorize as authorize_permission};
use pbac_core::AuthError;
use pbac_infra::TokenPair;

use crate::app::dto::{LoginRequest, PermissionQuery, RefreshTokenRequest, RoleQuery};
use crate::app::envelope::{ApiError, ApiOk, ApiResult};
use crate::app::services::AppServices;
use crate::context::CurrentPrincipal;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh_token";

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh_token", post(refresh_token))
        .route("/user", get(user))
        .route("/is_authorized", get(is_authorized))
        .route("/authorities", get(authorities))
        .route("/authorize", get(authorize))
}

fn bearer_header(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            ApiError::from(AuthError::token_not_found("Authorization header is missing"))
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<TokenPair> {
    let pair = services
        .auth
        .login(&request.username, &request.password)
        .await?;
    Ok(ApiOk(pair))
}

/// POST /auth/refresh_token
pub async fn refresh_token(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<RefreshTokenRequest>,
) -> ApiResult<TokenPair> {
    let pair = services.auth.refresh(&request.refresh_token).await?;
    Ok(ApiOk(pair))
}

/// GET /auth/user
pub async fn user(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> ApiResult<UserSummary> {
    let bearer = bearer_header(&headers)?;
    let identity = services
        .auth
        .identity_from_access_token(bearer)
        .await
        .map_err(ApiError::for_identity)?;
    Ok(ApiOk(identity))
}

/// GET /auth/is_authorized?role=NAME
pub async fn is_authorized(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Query(query): Query<RoleQuery>,
) -> ApiResult<bool> {
    let bearer = bearer_header(&headers)?;
    let allowed = services.auth.is_authorized(bearer, &query.role).await?;
    Ok(ApiOk(allowed))
}

/// GET /auth/authorities
pub async fn authorities(CurrentPrincipal(principal): CurrentPrincipal) -> ApiResult<AuthoritySet> {
    Ok(ApiOk(principal.authorities))
}

/// GET /auth/authorize?permission=NAME
pub async fn authorize(
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<PermissionQuery>,
) -> ApiResult<bool> {
    authorize_permission(&principal, &Permission::new(query.permission))?;
    Ok(ApiOk(true))
}
