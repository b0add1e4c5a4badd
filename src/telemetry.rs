//! Telemetry helpers for structured logging.

/// Installs a `tracing-subscriber` fmt subscriber filtered by `RUST_LOG`.
///
/// Does nothing if a global subscriber is already set, so embedding
/// applications keep their own.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
