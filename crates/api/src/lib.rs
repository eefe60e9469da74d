//! HTTP API: router, authentication pipeline and response envelope.

pub mod app;
pub mod context;
pub mod middleware;
