//! Logging setup for the docsmith CLI.
//!
//! Logs go to stderr so reports on stdout stay machine-readable.
//!
//! The filter is chosen in this order:
//! 1. `--verbose`: debug for docsmith
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. warnings for docsmith

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter for the given flags. `verbose` wins over `quiet`.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("docsmith=debug")
    } else if quiet {
        EnvFilter::new("docsmith=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docsmith=warn"))
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logger(verbose: bool, quiet: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .try_init();
}
