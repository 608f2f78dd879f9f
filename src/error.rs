//! Instrumentation errors.
//!
//! These signal misuse of the instrumentation layer itself (conflicting
//! definitions, missing labels). They are never turned into an HTTP status
//! and must not be confused with the `status` label of a request.

use thiserror::Error;

use crate::domain::metric::MetricKind;

/// Errors raised by the metric registry and the recorders built on it.
#[derive(Debug, Error)]
pub enum InstrumentationError {
  /// A metric name was registered twice with incompatible shapes.
  #[error(
    "metric `{name}` already registered as {existing_kind} {existing_labels:?}, \
     cannot re-register as {requested_kind} {requested_labels:?}"
  )]
  Conflict {
    name: String,
    existing_kind: MetricKind,
    existing_labels: Vec<String>,
    requested_kind: MetricKind,
    requested_labels: Vec<String>,
  },

  /// A declared label had no value at resolve time.
  #[error("metric `{name}` requires label `{label}`")]
  MissingLabel { name: String, label: String },

  /// A value was supplied for a label the metric never declared.
  #[error("metric `{name}` has no label `{label}`")]
  UnexpectedLabel { name: String, label: String },

  /// No metric with this name was registered.
  #[error("metric `{0}` is not registered")]
  UnknownMetric(String),

  /// The metric exists but is of a different kind than requested.
  #[error("metric `{name}` is a {actual}, not a {expected}")]
  KindMismatch {
    name: String,
    expected: MetricKind,
    actual: MetricKind,
  },

  /// Error reported by the underlying Prometheus client.
  #[error("prometheus: {0}")]
  Prometheus(#[from] prometheus::Error),
}

/// Convenience alias used across the instrumentation modules.
pub type Result<T> = std::result::Result<T, InstrumentationError>;
