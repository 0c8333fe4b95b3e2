//! Tracing setup for the `vaxsched` binary.
//!
//! stdout carries the shell transcript that users and scripts read, so every
//! log line goes to stderr. The default level is `warn`: ledger mutations log
//! at `info` with the shell's session id and show up under `RUST_LOG=info`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the subscriber at `warn`, unless `RUST_LOG` says otherwise.
pub fn init() {
    init_with_level("warn")
}

/// Install the subscriber with `default_level` as the fallback filter.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Debug-level logging routed through the test harness capture.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
