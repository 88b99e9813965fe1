//! Log subscriber setup for the CLI

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "car_listing_pipeline=info";

/// Filter used with `--verbose`
pub const VERBOSE_LOG_FILTER: &str = "car_listing_pipeline=debug";

/// Build the log filter; `--verbose` wins over `RUST_LOG`
pub fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

/// Install the global subscriber
///
/// Logs go to stderr so that command output on stdout stays clean.
pub fn init_logging(verbose: bool) {
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::registry()
        .with(log_filter(verbose))
        .with(console_layer)
        .try_init();
}
