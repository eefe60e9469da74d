//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` first, then `fallback`, then `info`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a JSON subscriber for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(fallback: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
