//! Logging setup
//!
//! Diagnostics go to stderr so that stdout stays clean for the report.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when verbose.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}
