//! Minimal tracing setup for tools and tests.

/// Initialize a plain-text tracing subscriber.
///
/// Respects `RUST_LOG`; falls back to `default_level` when it is unset.
/// Calling it twice is harmless (the second call is ignored), so test
/// helpers can call it freely.
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
