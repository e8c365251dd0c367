//! Diagnostic logging via `tracing`.
//!
//! Silent unless asked for: the filter comes from `IFWR_LOG` (EnvFilter
//! syntax, e.g. "debug" or "ifwr=trace"), otherwise `--verbose` selects
//! `debug` and the default is `off`. Events always go to stderr so the
//! child's stdout stays byte-identical.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "IFWR_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(std::env::var(LOG_ENV).ok().as_deref(), verbose))
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_filter(env_value: Option<&str>, verbose: bool) -> EnvFilter {
    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directives) => {
            EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(default_level(verbose)))
        }
        None => EnvFilter::new(default_level(verbose)),
    }
}

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "off"
    }
}
