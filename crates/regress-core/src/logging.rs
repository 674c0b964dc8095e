//! Tracing bootstrap for harness binaries and tests.

use tracing_subscriber::EnvFilter;

/// Installs a formatted `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Calling this more than once (every
/// test in a binary, say) is harmless: later calls leave the first
/// subscriber in place and return `false`.
pub fn init_logging(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .try_init()
        .is_ok()
}
