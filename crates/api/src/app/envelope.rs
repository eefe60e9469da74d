//! Two-field response envelope and error-kind → status mapping.
//!
//! Every response body is `{"ok": <payload|null>, "err": <error|null>}` with
//! exactly one side non-null.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use pbac_core::{AuthError, ErrorKind};

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub ok: Option<T>,
    pub err: Option<AuthError>,
}

/// Successful payload, rendered as `200 {"ok": .., "err": null}`.
#[derive(Debug)]
pub struct ApiOk<T>(pub T);

impl<T: Serialize> IntoResponse for ApiOk<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            ok: Some(self.0),
            err: None,
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiOk<T>, ApiError>;

/// A structured error plus the status it is written with.
#[derive(Debug, Error)]
#[error("{status}: {error}")]
pub struct ApiError {
    pub status: StatusCode,
    pub error: AuthError,
}

impl ApiError {
    pub fn new(status: StatusCode, error: AuthError) -> Self {
        Self { status, error }
    }

    /// Always 401, whatever the kind (pipeline rejections, missing identity).
    pub fn unauthorized(error: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error)
    }

    /// Identity lookups report a missing user as 404 instead of 400.
    pub fn for_identity(error: AuthError) -> Self {
        if error.is(ErrorKind::RepositoryError) {
            Self::new(StatusCode::NOT_FOUND, error)
        } else {
            Self::from(error)
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::RepositoryError => StatusCode::BAD_REQUEST,
        ErrorKind::ServiceError
        | ErrorKind::NoUsernameInTokenError
        | ErrorKind::ExpiredTokenError
        | ErrorKind::InvalidTokenError
        | ErrorKind::TokenNotFoundError => StatusCode::UNAUTHORIZED,
        ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self::new(status_for(error.kind()), error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: Envelope<()> = Envelope {
            ok: None,
            err: Some(self.error),
        };
        (self.status, Json(body)).into_response()
    }
}
