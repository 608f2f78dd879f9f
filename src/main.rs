//! Flight Tracker Service — Entry Point
//!
//! Runs one instrumented service (`user_manager` or `data_collector`,
//! from `[service] name`) with its `/metrics` exposition. Runs until
//! SIGINT, then drains in-flight requests.
//!
//! Wiring sequence:
//! 1. Load config (first CLI argument, default `config.toml`) + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Resolve process identity from `NODE_NAME` / `HOSTNAME`
//! 4. Create the metric registry and both instrumentations
//! 5. Create the OpenSky client behind the `FlightSource` port
//! 6. Build the router and serve
//! 7. Wait for SIGINT → readiness 503 → drain → exit

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use flight_tracker_metrics::adapters::flights::{OpenSkyClient, OpenSkyClientConfig};
use flight_tracker_metrics::adapters::http::{AppState, ServiceServer, build_router};
use flight_tracker_metrics::adapters::metrics::{ExpositionEndpoint, HealthState, MetricRegistry};
use flight_tracker_metrics::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use flight_tracker_metrics::domain::identity::ProcessIdentity;
use flight_tracker_metrics::telemetry;
use flight_tracker_metrics::usecases::dependency_instrumentation::{DependencyInstrumentation, DependencySpec};
use flight_tracker_metrics::usecases::flight_lookup::FlightLookup;
use flight_tracker_metrics::usecases::request_instrumentation::RequestInstrumentation;
use flight_tracker_metrics::usecases::user_registry::UserRegistry;

#[tokio::main]
async fn main() -> Result<()> {
  // ── 1. Configuration ────────────────────────────────────
  let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
  let config = load_config(&path).context("Failed to load configuration")?;

  // ── 2. Logging ──────────────────────────────────────────
  telemetry::init_tracing(&config.service.log_level)?;

  // ── 3. Identity ─────────────────────────────────────────
  let identity = ProcessIdentity::from_env(config.service.name.clone());
  info!(
    identity = %identity,
    version = env!("CARGO_PKG_VERSION"),
    bind = %config.server.bind_address,
    "Starting flight tracker service"
  );

  // ── 4. Metrics ──────────────────────────────────────────
  let registry = Arc::new(MetricRegistry::new());
  let instrumentation = RequestInstrumentation::new(&registry, identity.clone())
    .context("Failed to register request metrics")?;
  let dependency = DependencyInstrumentation::new(&registry, identity, DependencySpec::opensky())
    .context("Failed to register dependency metrics")?;

  // ── 5. Flight source ────────────────────────────────────
  let opensky = OpenSkyClient::new(OpenSkyClientConfig::from(&config.opensky))
    .context("Failed to create OpenSky client")?;
  let flights = Arc::new(FlightLookup::new(Arc::new(opensky), dependency));

  // ── 6. Router + server ──────────────────────────────────
  let health = Arc::new(HealthState::new());
  let state = AppState {
    instrumentation,
    users: Arc::new(UserRegistry::new()),
    flights,
    health: Arc::clone(&health),
  };
  let exposition = Arc::new(ExpositionEndpoint::new(Arc::clone(&registry)));
  let router = build_router(state, exposition, &config.server.metrics_path);

  let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
  let server = ServiceServer::new(router, health, config.server.bind_address.clone());
  let server_handle = tokio::spawn(async move {
    if let Err(e) = server.run(shutdown_rx).await {
      error!(error = %e, "Service server failed");
    }
  });

  // ── 7. Wait for SIGINT ──────────────────────────────────
  signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
  info!("SIGINT received, initiating graceful shutdown");
  let _ = shutdown_tx.send(());

  let _ = tokio::time::timeout(std::time::Duration::from_secs(30), server_handle).await;

  info!("Shutdown complete");
  Ok(())
}
