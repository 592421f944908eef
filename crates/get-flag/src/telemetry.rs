//! Logging for `get-flag`.
//!
//! Human-readable events go to **stderr** only; stdout carries nothing but the
//! flag line. The level is fixed at build time (`GET_FLAG_LOG`, default
//! `warn`) because the binary does not read its environment.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Build-time log filter directive.
pub const LOG_LEVEL: &str = match option_env!("GET_FLAG_LOG") {
    Some(level) => level,
    None => "warn",
};

/// Initialise the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a subscriber has
/// already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level)
        .map_err(|e| anyhow::anyhow!("invalid log filter {log_level:?}: {e}"))?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise get-flag tracing subscriber: {e}"))
}
