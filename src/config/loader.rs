//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Default configuration path when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    service = %config.service.name,
    bind = %config.server.bind_address,
    metrics_path = %config.server.metrics_path,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty service name
/// - A metrics path that is an absolute route
/// - Positive timeouts and load parameters
fn validate_config(config: &AppConfig) -> Result<()> {
  // Service validation
  anyhow::ensure!(
    !config.service.name.trim().is_empty(),
    "service.name must not be empty"
  );

  // Server validation
  anyhow::ensure!(
    config.server.metrics_path.starts_with('/'),
    "server.metrics_path must start with '/', got {:?}",
    config.server.metrics_path
  );
  anyhow::ensure!(
    !["/ping", "/live", "/ready", "/users"].contains(&config.server.metrics_path.as_str()),
    "server.metrics_path {:?} collides with a service route",
    config.server.metrics_path
  );
  anyhow::ensure!(
    !config.server.bind_address.is_empty(),
    "server.bind_address must not be empty"
  );

  // OpenSky validation
  anyhow::ensure!(
    !config.opensky.base_url.is_empty(),
    "opensky.base_url must not be empty"
  );
  anyhow::ensure!(
    config.opensky.timeout_ms > 0,
    "opensky.timeout_ms must be positive"
  );
  anyhow::ensure!(
    config.opensky.lookback_hours > 0,
    "opensky.lookback_hours must be positive"
  );

  // Load driver validation
  anyhow::ensure!(
    config.load.virtual_users > 0,
    "load.virtual_users must be positive"
  );
  anyhow::ensure!(
    config.load.requests_per_second > 0,
    "load.requests_per_second must be positive"
  );
  anyhow::ensure!(
    !config.load.airports.is_empty(),
    "load.airports must list at least one airport"
  );
  anyhow::ensure!(
    !config.load.collision_key.is_empty(),
    "load.collision_key must not be empty"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = parse_config("[service]\nname = \"data_collector\"\n").unwrap();
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.server.metrics_path, "/metrics");
    assert_eq!(config.load.collision_key, "fixed-test-key-123");
    assert_eq!(config.load.ping_urls.len(), 4);
    assert_eq!(config.load.airports[0], "LICC");
  }

  #[test]
  fn test_relative_metrics_path_rejected() {
    let err = parse_config(
      "[service]\nname = \"user_manager\"\n[server]\nmetrics_path = \"metrics\"\n",
    )
    .unwrap_err();
    assert!(err.to_string().contains("metrics_path"));
  }

  #[test]
  fn test_empty_service_name_rejected() {
    assert!(parse_config("[service]\nname = \"  \"\n").is_err());
  }

  #[test]
  fn test_zero_virtual_users_rejected() {
    let err = parse_config("[service]\nname = \"x\"\n[load]\nvirtual_users = 0\n").unwrap_err();
    assert!(err.to_string().contains("virtual_users"));
  }
}
