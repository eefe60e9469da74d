//! Per-request authentication pipeline.
//!
//! One pass, in order:
//! 1. login/refresh endpoints skip every check
//! 2. no bearer credential: continue without identity
//! 3. expired token: reject with `ExpiredTokenError`
//! 4. unreadable subject: reject with the codec's error
//! 5. no identity yet: load the user, build its authorities, check the token
//!    subject against it, install the `Principal`
//!
//! Rejections are written as a `401` envelope and stop the request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use pbac_auth::{Principal, TokenOutcome};
use pbac_core::AuthError;
use pbac_infra::BEARER_PREFIX;

use crate::app::envelope::ApiError;
use crate::app::routes::auth::{LOGIN_PATH, REFRESH_PATH};
use crate::app::services::AppServices;

fn skips_pipeline(path: &str) -> bool {
    path.ends_with(LOGIN_PATH) || path.ends_with(REFRESH_PATH)
}

fn reject(error: AuthError) -> Response {
    warn!(kind = %error.kind(), cause = %error.cause, "request rejected by authentication pipeline");
    ApiError::unauthorized(error).into_response()
}

pub async fn authentication_pipeline(
    State(services): State<Arc<AppServices>>,
    mut req: Request,
    next: Next,
) -> Response {
    if skips_pipeline(req.uri().path()) {
        debug!(path = %req.uri().path(), "public endpoint; skipping authentication");
        return next.run(req).await;
    }

    let token = match req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
    {
        Some(token) => token.trim().to_string(),
        None => {
            debug!("no bearer credential; continuing unauthenticated");
            return next.run(req).await;
        }
    };

    let codec = services.auth.codec();

    // Expiry is checked before anything else so clients get a distinct
    // "please refresh" signal.
    match codec.is_expired(&token) {
        TokenOutcome::Expired { error, .. } => return reject(error),
        TokenOutcome::Valid(true) => {
            return reject(AuthError::expired_token("access token expiry has passed"));
        }
        TokenOutcome::Valid(false) | TokenOutcome::Invalid(_) => {}
    }

    let subject = match codec.extract_subject(&token) {
        TokenOutcome::Valid(subject) => subject,
        TokenOutcome::Expired { error, .. } | TokenOutcome::Invalid(error) => return reject(error),
    };

    if req.extensions().get::<Principal>().is_none() {
        let principal = match services.auth.principal_for(&subject).await {
            Ok(principal) => principal,
            Err(error) => return reject(error),
        };

        if let Err(error) = codec.is_token_valid(&token, principal.username()) {
            return reject(error);
        }

        debug!(username = %principal.username(), authorities = principal.authorities.len(), "identity installed");
        req.extensions_mut().insert(principal);
    }

    next.run(req).await
}
