use axum::Router;

pub mod auth;
pub mod system;

/// Router for everything behind the authentication pipeline.
pub fn router() -> Router {
    Router::new().nest("/auth", auth::router())
}
