//! Process-wide logging setup shared by the binaries.

/// Subscriber configuration (filter, JSON layer).
pub mod tracing;

/// Install the JSON subscriber. Later calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Like [`init`], with an explicit fallback filter used when `RUST_LOG` is unset.
pub fn init_with_default(directive: &str) {
    tracing::init_with_default(directive);
}
