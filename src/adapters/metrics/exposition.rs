//! Prometheus Exposition - Pull-format Snapshot Endpoint
//!
//! Serializes the current state of a `MetricRegistry` with the
//! `prometheus` text encoder. Reading never mutates a series; with no
//! traffic in between, two scrapes return identical bytes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, TextEncoder};
use tracing::error;

use super::registry::MetricRegistry;
use crate::error::Result;

/// One encoded scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Media type of `body` (`text/plain; version=0.0.4`).
    pub content_type: String,
    /// Encoded exposition text.
    pub body: Vec<u8>,
}

/// Read path serving registry snapshots to scrapers.
pub struct ExpositionEndpoint {
    /// Registry being exposed.
    registry: Arc<MetricRegistry>,
}

impl ExpositionEndpoint {
    /// Expose `registry`.
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self { registry }
    }

    /// Encode every registered series.
    pub fn snapshot(&self) -> Result<MetricsSnapshot> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut body = Vec::new();
        encoder.encode(&metric_families, &mut body)?;
        Ok(MetricsSnapshot {
            content_type: encoder.format_type().to_string(),
            body,
        })
    }

    /// Router answering `GET <path>` with a snapshot.
    pub fn router(self: Arc<Self>, path: &str) -> Router {
        Router::new()
            .route(path, get(Self::scrape))
            .with_state(self)
    }

    async fn scrape(State(endpoint): State<Arc<ExpositionEndpoint>>) -> Response {
        match endpoint.snapshot() {
            Ok(snapshot) => (
                [(header::CONTENT_TYPE, snapshot.content_type)],
                snapshot.body,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "Failed to encode metrics snapshot");
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
            }
        }
    }
}
