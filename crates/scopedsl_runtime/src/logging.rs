//! Diagnostic logging for the `scopedsl` binary.
//!
//! Library crates only emit `tracing` events; installing a subscriber is the
//! binary's job. Output goes to stderr so resolved sets on stdout stay
//! pipeable.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "SCOPEDSL_LOG";

/// Filter used when neither variable is set.
pub const DEFAULT_FILTER: &str = "warn";

/// Filter used for `--verbose` when neither variable is set.
pub const VERBOSE_FILTER: &str = "warn,scopedsl_engine=debug,scopedsl_debug=debug,scopedsl_runtime=debug";

/// Builds the filter: `SCOPEDSL_LOG`, then `RUST_LOG`, then the default.
#[must_use]
pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }))
}

/// Installs the stderr subscriber.
///
/// A second call is a no-op.
///
/// # Example
/// ```bash
/// SCOPEDSL_LOG=scopedsl_engine=debug scopedsl defs.scope world.json
/// ```
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
