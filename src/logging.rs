//! Logging setup on top of tracing-subscriber

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging for the CLI.
///
/// `RUST_LOG` selects the filter (default `info`), e.g.
/// `RUST_LOG=sr_crafting_calculator=debug` to trace every resolved item.
/// Logs go to stderr so report output on stdout stays clean.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Verbose logging for tests; safe to call more than once.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
