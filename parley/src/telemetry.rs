//! `tracing-subscriber` bootstrap for binaries embedding the relay.

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise `fallback` (usually the configured
/// `log_filter`), and `info` if that does not parse either.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a global `fmt` subscriber writing to stderr.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(fallback: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
