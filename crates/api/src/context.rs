use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use pbac_auth::Principal;
use pbac_core::AuthError;

use crate::app::envelope::ApiError;

/// The identity installed by the authentication pipeline for this request.
///
/// Rejects with `AccessDenied` (401) when the pipeline ran without
/// installing one, i.e. the request carried no bearer credential.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(|| {
                ApiError::unauthorized(AuthError::access_denied(
                    "no authenticated identity for this request",
                ))
            })
    }
}
