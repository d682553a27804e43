//! Log subscriber setup.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber. `directive` is a level or a full
/// `EnvFilter` directive; an invalid one falls back to `info`.
pub fn init(directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))
}
