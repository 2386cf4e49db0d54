//! Logging setup
//!
//! The library only emits `tracing` events (secret values are never logged).
//! Applications that do not install their own subscriber can call [`init`].

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `top_secret_core=debug`
pub const LOG_ENV_VAR: &str = "TOP_SECRET_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install a stderr `fmt` subscriber filtered by `TOP_SECRET_LOG`
///
/// Returns `false` when a global subscriber was already installed, in which
/// case nothing changes.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter_from_env())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
