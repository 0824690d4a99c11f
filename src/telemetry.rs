use tracing_subscriber::{fmt, EnvFilter};

/// Installs the JSON `tracing` subscriber filtered by `RUST_LOG`.
///
/// Returns `false` when a global subscriber was already installed, which makes the call
/// safe to repeat from tests and embedding services.
pub fn init_tracing() -> bool {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
        .is_ok()
}
