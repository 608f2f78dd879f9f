//! Metrics and Monitoring Adapters
//!
//! Prometheus-backed metric registry, the pull-format exposition
//! endpoint, and the ping/liveness/readiness probes, all via axum 0.7.

pub mod exposition;
pub mod health;
pub mod registry;

pub use exposition::{ExpositionEndpoint, MetricsSnapshot};
pub use health::HealthState;
pub use registry::{CounterFamily, GaugeFamily, MetricHandle, MetricRegistry, SeriesHandle};
