//! Load Driver — Entry Point
//!
//! Reads the `[load]` section of the config (first CLI argument, default
//! `config.toml`), drives the services for `duration_seconds` or until
//! SIGINT, then prints the per-task report.

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;

use flight_tracker_metrics::adapters::load::LoadDriver;
use flight_tracker_metrics::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use flight_tracker_metrics::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
  let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
  let config = load_config(&path).context("Failed to load configuration")?;
  telemetry::init_tracing(&config.service.log_level)?;

  let driver = LoadDriver::new(config.load.clone()).context("Failed to create load driver")?;
  let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

  tokio::spawn(async move {
    if signal::ctrl_c().await.is_ok() {
      info!("SIGINT received, stopping load run");
      let _ = shutdown_tx.send(());
    }
  });

  let report = driver.run(shutdown_rx).await?;

  info!(
    sent = report.total_sent(),
    failed = report.total_failed(),
    tasks = %serde_json::to_string(&report.summary())?,
    "Load run complete"
  );
  println!("{report}");
  Ok(())
}
