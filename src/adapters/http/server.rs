//! Service Server - axum Listener with Graceful Shutdown

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::adapters::metrics::health::HealthState;

/// Axum server for one instrumented service.
pub struct ServiceServer {
  /// Fully layered router.
  router: Router,
  /// Readiness flag flipped on shutdown.
  health: Arc<HealthState>,
  /// Listen address.
  bind_address: String,
}

impl ServiceServer {
  /// Create a server for `router`.
  pub fn new(router: Router, health: Arc<HealthState>, bind_address: String) -> Self {
    Self {
      router,
      health,
      bind_address,
    }
  }

  /// Serve until the shutdown broadcast fires, then drain.
  #[instrument(skip(self, shutdown_rx), fields(address = %self.bind_address))]
  pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&self.bind_address)
      .await
      .with_context(|| format!("Failed to bind {}", self.bind_address))?;

    info!(address = %self.bind_address, "Service listening");

    let health = self.health;
    axum::serve(listener, self.router)
      .with_graceful_shutdown(async move {
        let _ = shutdown_rx.recv().await;
        health.set_draining();
        info!("Draining in-flight requests");
      })
      .await
      .context("Server failed")?;

    Ok(())
  }
}
