//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`. Process
//! identity (`NODE_NAME` / `HOSTNAME`) is not configured here: it is
//! read from the environment once at startup.

pub mod loader;

use serde::Deserialize;

/// Top-level configuration shared by the service and the load driver.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and logging.
  pub service: ServiceConfig,
  /// HTTP server settings.
  #[serde(default)]
  pub server: ServerConfig,
  /// OpenSky flights API client.
  #[serde(default)]
  pub opensky: OpenSkyConfig,
  /// Load driver settings.
  #[serde(default)]
  pub load: LoadConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Service name used as the `service` label.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Listen address of the service.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
  /// Path of the exposition endpoint.
  #[serde(default = "default_metrics_path")]
  pub metrics_path: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind_address: default_bind_address(),
      metrics_path: default_metrics_path(),
    }
  }
}

/// OpenSky REST client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenSkyConfig {
  /// API base URL.
  #[serde(default = "default_opensky_url")]
  pub base_url: String,
  /// Request timeout (milliseconds).
  #[serde(default = "default_opensky_timeout")]
  pub timeout_ms: u64,
  /// How far back to query flights (hours).
  #[serde(default = "default_lookback_hours")]
  pub lookback_hours: u32,
}

impl Default for OpenSkyConfig {
  fn default() -> Self {
    Self {
      base_url: default_opensky_url(),
      timeout_ms: default_opensky_timeout(),
      lookback_hours: default_lookback_hours(),
    }
  }
}

/// Load driver configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
  /// Base URL of the user manager service.
  #[serde(default = "default_user_manager_url")]
  pub user_manager_url: String,
  /// Base URL of the data collector service.
  #[serde(default = "default_data_collector_url")]
  pub data_collector_url: String,
  /// Services pinged by the health check task.
  #[serde(default = "default_ping_urls")]
  pub ping_urls: Vec<String>,
  /// Concurrent virtual users.
  #[serde(default = "default_virtual_users")]
  pub virtual_users: usize,
  /// Global request pacing across all users.
  #[serde(default = "default_requests_per_second")]
  pub requests_per_second: u32,
  /// Run length (seconds).
  #[serde(default = "default_duration_seconds")]
  pub duration_seconds: u64,
  /// Airports queried by the flight read task.
  #[serde(default = "default_airports")]
  pub airports: Vec<String>,
  /// Idempotency key shared by every collision request.
  #[serde(default = "default_collision_key")]
  pub collision_key: String,
  /// Pause between two tasks of one user (milliseconds).
  #[serde(default = "default_think_time")]
  pub think_time_ms: u64,
}

impl Default for LoadConfig {
  fn default() -> Self {
    Self {
      user_manager_url: default_user_manager_url(),
      data_collector_url: default_data_collector_url(),
      ping_urls: default_ping_urls(),
      virtual_users: default_virtual_users(),
      requests_per_second: default_requests_per_second(),
      duration_seconds: default_duration_seconds(),
      airports: default_airports(),
      collision_key: default_collision_key(),
      think_time_ms: default_think_time(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bind_address() -> String {
  "0.0.0.0:5000".to_string()
}

fn default_metrics_path() -> String {
  "/metrics".to_string()
}

fn default_opensky_url() -> String {
  "https://opensky-network.org/api".to_string()
}

fn default_opensky_timeout() -> u64 {
  15_000
}

fn default_lookback_hours() -> u32 {
  24
}

fn default_user_manager_url() -> String {
  "http://localhost:30000".to_string()
}

fn default_data_collector_url() -> String {
  "http://localhost:30001".to_string()
}

fn default_ping_urls() -> Vec<String> {
  (30000..=30003)
    .map(|port| format!("http://localhost:{port}"))
    .collect()
}

fn default_virtual_users() -> usize {
  10
}

fn default_requests_per_second() -> u32 {
  20
}

fn default_duration_seconds() -> u64 {
  60
}

fn default_airports() -> Vec<String> {
  ["LICC", "LIRF", "LIMC", "KJFK", "EGLL", "RJTT"]
    .iter()
    .map(|a| a.to_string())
    .collect()
}

fn default_collision_key() -> String {
  "fixed-test-key-123".to_string()
}

fn default_think_time() -> u64 {
  1_000
}
