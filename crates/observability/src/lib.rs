//! Process-wide tracing setup.

/// Tracing subscriber configuration (filters, JSON formatting).
pub mod tracing;

/// Initialize process-wide tracing with `fallback_filter` used when
/// `RUST_LOG` is unset or unparsable.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init(fallback_filter: &str) {
    tracing::init(fallback_filter);
}
