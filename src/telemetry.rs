//! Structured Logging Setup
//!
//! JSON lines via `tracing-subscriber`. `RUST_LOG` wins over the
//! configured level when set.

use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` if present, else `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
  EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global JSON subscriber.
///
/// Returns an error if a subscriber is already installed.
pub fn init_tracing(default_level: &str) -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(env_filter(default_level))
    .json()
    .try_init()
    .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}
