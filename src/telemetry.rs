//! Logging setup for binaries and tests.

/// Installs an env-filtered fmt subscriber (`RUST_LOG`) unless the host
/// application already set one.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
