//! Logging Module
//!
//! Tracing subscriber setup for the `otc-market` binary. The library itself
//! only emits `tracing` events and never installs a subscriber.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter for `level`, unless `RUST_LOG` is set.
///
/// Unrecognised levels fall back to `info`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_tracing(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(env_filter(level))
        .try_init();
}
