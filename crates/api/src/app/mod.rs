//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/codec wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs
//! - `envelope.rs`: `{ok, err}` responses and status mapping

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod envelope;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Prefix all pipeline-guarded routes are nested under.
pub const API_PREFIX: &str = "/api/v1";

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let api = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(services.clone()))
            .layer(axum::middleware::from_fn_with_state(
                services,
                middleware::authentication_pipeline,
            )),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .nest(API_PREFIX, api)
}
