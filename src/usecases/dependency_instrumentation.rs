//! Dependency Instrumentation - Outbound Call Metrics
//!
//! Handler code reports outbound calls the request wrapper cannot see:
//! - `record_dependency_call`: last-call duration per dimension plus a
//!   success/failure call counter
//! - `record_domain_gauge`: a point-in-time value per dimension (e.g.
//!   flights fetched by the last collection); history is not retained
//!
//! Nothing here is invoked automatically.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::adapters::metrics::registry::{CounterFamily, GaugeFamily, MetricRegistry};
use crate::domain::identity::ProcessIdentity;
use crate::domain::metric::{LABEL_NODE, LABEL_SERVICE, LABEL_STATUS, LabelSet};
use crate::error::{InstrumentationError, Result};

/// `status` label value for a successful call.
pub const STATUS_SUCCESS: &str = "success";
/// `status` label value for a failed call.
pub const STATUS_FAILURE: &str = "failure";

/// Names and help texts of one dependency's metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
  /// Dependency name, used in logs.
  pub dependency: String,
  /// Label carrying the per-call dimension, e.g. `airport_code`.
  pub dimension_label: String,
  /// Gauge holding the last call duration per dimension.
  pub duration_metric: String,
  /// Help text of the duration gauge.
  pub duration_help: String,
  /// Counter of calls by outcome.
  pub calls_metric: String,
  /// Help text of the call counter.
  pub calls_help: String,
  /// Optional point-in-time domain gauge: (name, help).
  pub domain_gauge: Option<(String, String)>,
}

impl DependencySpec {
  /// Metrics of the OpenSky flights API.
  pub fn opensky() -> Self {
    Self {
      dependency: "opensky".to_string(),
      dimension_label: "airport_code".to_string(),
      duration_metric: "opensky_api_duration_seconds".to_string(),
      duration_help: "Time taken to fetch data from OpenSky API in seconds".to_string(),
      calls_metric: "opensky_api_calls_total".to_string(),
      calls_help: "Total number of OpenSky API calls".to_string(),
      domain_gauge: Some((
        "flights_fetched_last_collection".to_string(),
        "Number of flights fetched in the last data collection".to_string(),
      )),
    }
  }
}

/// Recorder for one external dependency.
#[derive(Clone)]
pub struct DependencyInstrumentation {
  /// Static service/node labels.
  identity: ProcessIdentity,
  /// Metric names.
  spec: Arc<DependencySpec>,
  /// Last call duration per dimension.
  duration: GaugeFamily,
  /// Calls by outcome.
  calls: CounterFamily,
  /// Point-in-time value per dimension.
  domain_gauge: Option<GaugeFamily>,
}

impl DependencyInstrumentation {
  /// Register the dependency metrics on `registry`.
  pub fn new(registry: &MetricRegistry, identity: ProcessIdentity, spec: DependencySpec) -> Result<Self> {
    let dimension = spec.dimension_label.as_str();
    let duration = registry.gauge(
      &spec.duration_metric,
      &spec.duration_help,
      &[LABEL_SERVICE, LABEL_NODE, dimension],
    )?;
    let calls = registry.counter(
      &spec.calls_metric,
      &spec.calls_help,
      &[LABEL_SERVICE, LABEL_NODE, LABEL_STATUS],
    )?;
    let domain_gauge = match &spec.domain_gauge {
      Some((name, help)) => Some(registry.gauge(name, help, &[LABEL_SERVICE, LABEL_NODE, dimension])?),
      None => None,
    };

    Ok(Self {
      identity,
      spec: Arc::new(spec),
      duration,
      calls,
      domain_gauge,
    })
  }

  fn base_labels(&self) -> LabelSet {
    LabelSet::new()
      .with(LABEL_SERVICE, self.identity.service.as_str())
      .with(LABEL_NODE, self.identity.node.as_str())
  }

  fn dimension_labels(&self, dimension: &str) -> LabelSet {
    self.base_labels().with(&self.spec.dimension_label, dimension)
  }

  /// Record one completed outbound call.
  ///
  /// Overwrites the duration gauge of `dimension` and increments the
  /// success or failure counter by one.
  pub fn record_dependency_call(&self, dimension: &str, duration: Duration, success: bool) -> Result<()> {
    self
      .duration
      .set(&self.dimension_labels(dimension), duration.as_secs_f64())?;
    let status = if success { STATUS_SUCCESS } else { STATUS_FAILURE };
    self.calls.inc(&self.base_labels().with(LABEL_STATUS, status))?;

    debug!(
      dependency = %self.spec.dependency,
      dimension,
      elapsed_ms = duration.as_secs_f64() * 1_000.0,
      success,
      "Dependency call recorded"
    );
    Ok(())
  }

  /// Overwrite the domain gauge of `dimension`.
  ///
  /// Fails with `UnknownMetric` when `domain_gauge` is `None`.
  pub fn record_domain_gauge(&self, dimension: &str, value: f64) -> Result<()> {
    let gauge = self.domain_gauge.as_ref().ok_or_else(|| {
      InstrumentationError::UnknownMetric(format!("{}_domain_gauge", self.spec.dependency))
    })?;
    gauge.set(&self.dimension_labels(dimension), value)
  }

  /// Await an outbound call, then record its duration and outcome.
  ///
  /// The call's result is returned unchanged; a recording failure is
  /// logged, never surfaced to the caller.
  pub async fn time_call<Fut, T, E>(&self, dimension: &str, call: Fut) -> std::result::Result<T, E>
  where
    Fut: Future<Output = std::result::Result<T, E>>,
  {
    let started = Instant::now();
    let result = call.await;
    if let Err(e) = self.record_dependency_call(dimension, started.elapsed(), result.is_ok()) {
      error!(
        error = %e,
        dependency = %self.spec.dependency,
        dimension,
        "Dependency metrics could not be recorded"
      );
    }
    result
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn setup() -> (Arc<MetricRegistry>, DependencyInstrumentation) {
    let registry = Arc::new(MetricRegistry::new());
    let opensky = DependencyInstrumentation::new(
      &registry,
      ProcessIdentity::new("data_collector", "node-a"),
      DependencySpec::opensky(),
    )
    .unwrap();
    (registry, opensky)
  }

  fn calls(registry: &MetricRegistry, status: &str) -> Option<f64> {
    registry.sample(
      "opensky_api_calls_total",
      &LabelSet::new()
        .with("service", "data_collector")
        .with("node", "node-a")
        .with("status", status),
    )
  }

  fn by_airport(registry: &MetricRegistry, metric: &str, airport: &str) -> Option<f64> {
    registry.sample(
      metric,
      &LabelSet::new()
        .with("service", "data_collector")
        .with("node", "node-a")
        .with("airport_code", airport),
    )
  }

  #[test]
  fn test_success_then_failure() {
    let (registry, opensky) = setup();

    opensky
      .record_dependency_call("LICC", Duration::from_secs_f64(0.42), true)
      .unwrap();
    let d = by_airport(&registry, "opensky_api_duration_seconds", "LICC").unwrap();
    assert!((d - 0.42).abs() < 1e-9);
    assert_eq!(calls(&registry, "success"), Some(1.0));
    assert_eq!(calls(&registry, "failure"), None);

    opensky
      .record_dependency_call("LICC", Duration::from_secs_f64(1.5), false)
      .unwrap();
    let d = by_airport(&registry, "opensky_api_duration_seconds", "LICC").unwrap();
    assert!((d - 1.5).abs() < 1e-9);
    assert_eq!(calls(&registry, "success"), Some(1.0));
    assert_eq!(calls(&registry, "failure"), Some(1.0));
  }

  #[test]
  fn test_domain_gauge_is_a_snapshot() {
    let (registry, opensky) = setup();
    opensky.record_domain_gauge("LIRF", 42.0).unwrap();
    opensky.record_domain_gauge("LIRF", 7.0).unwrap();
    opensky.record_domain_gauge("KJFK", 3.0).unwrap();

    assert_eq!(by_airport(&registry, "flights_fetched_last_collection", "LIRF"), Some(7.0));
    assert_eq!(by_airport(&registry, "flights_fetched_last_collection", "KJFK"), Some(3.0));
  }

  #[test]
  fn test_domain_gauge_requires_definition() {
    let registry = MetricRegistry::new();
    let spec = DependencySpec {
      domain_gauge: None,
      ..DependencySpec::opensky()
    };
    let recorder =
      DependencyInstrumentation::new(&registry, ProcessIdentity::new("svc", "n"), spec).unwrap();
    assert!(matches!(
      recorder.record_domain_gauge("LICC", 1.0),
      Err(InstrumentationError::UnknownMetric(_))
    ));
  }

  #[tokio::test]
  async fn test_time_call_records_outcome_and_passes_result_through() {
    let (registry, opensky) = setup();

    let ok: std::result::Result<u32, String> = opensky.time_call("EGLL", async { Ok(12) }).await;
    let err: std::result::Result<u32, String> =
      opensky.time_call("EGLL", async { Err("timeout".to_string()) }).await;

    assert_eq!(ok, Ok(12));
    assert_eq!(err, Err("timeout".to_string()));
    assert_eq!(calls(&registry, "success"), Some(1.0));
    assert_eq!(calls(&registry, "failure"), Some(1.0));
    assert!(by_airport(&registry, "opensky_api_duration_seconds", "EGLL").is_some());
  }

  #[test]
  fn test_conflicting_dimension_label_is_rejected() {
    let registry = MetricRegistry::new();
    registry
      .gauge("opensky_api_duration_seconds", "x", &["service", "node", "icao"])
      .unwrap();
    let err = DependencyInstrumentation::new(
      &registry,
      ProcessIdentity::new("svc", "n"),
      DependencySpec::opensky(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, InstrumentationError::Conflict { .. }));
  }
}
