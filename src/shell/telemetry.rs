// Tracing bootstrap for binaries and tests embedding the adapter.

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, filtered by RUST_LOG. Safe to call more than
/// once; later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}
