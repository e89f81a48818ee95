//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "VBAEXPORT_LOG";

/// Install the global subscriber. Logs go to stderr so they never interleave
/// with the selector, which owns stdout while it runs.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
