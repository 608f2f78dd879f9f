//! Request Instrumentation - Per-invocation Request Metrics
//!
//! Wraps every handler invocation:
//! - increments `http_requests_in_progress{service,node}` on entry
//! - times the handler on a monotonic clock
//! - resolves the outcome status (explicit, else 200, else 500 on fault)
//! - always records `http_requests_total`, overwrites
//!   `http_request_duration_seconds` and decrements the in-flight gauge
//!
//! Recording lives in the `Drop` of `RequestMeasurement`, so it runs on
//! normal return, on `Err`, on panic unwinding and when the handler future
//! is dropped mid-flight. The wrapper never alters the handler's result.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use prometheus::Gauge;
use tracing::{debug, error, warn};

use crate::adapters::metrics::registry::{CounterFamily, GaugeFamily, MetricRegistry};
use crate::domain::identity::ProcessIdentity;
use crate::domain::metric::{
  LABEL_ENDPOINT, LABEL_METHOD, LABEL_NODE, LABEL_SERVICE, LABEL_STATUS, LabelSet,
};
use crate::domain::reply::{FAULT_STATUS, Reply, ResponseStatus};
use crate::error::Result;
use crate::ports::handler::{InboundRequest, RequestHandler};

/// Counter of handled requests.
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
/// Gauge holding the duration of the last request per route.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
/// Gauge of requests currently executing.
pub const HTTP_REQUESTS_IN_PROGRESS: &str = "http_requests_in_progress";

struct Inner {
  /// Static service/node labels.
  identity: ProcessIdentity,
  /// `http_requests_total{service,node,method,endpoint,status}`.
  requests_total: CounterFamily,
  /// `http_request_duration_seconds{service,node,method,endpoint}`.
  request_duration: GaugeFamily,
  /// `http_requests_in_progress{service,node}`, resolved once.
  in_progress: Gauge,
}

/// Request metrics recorder shared by every wrapped handler of a service.
///
/// Cheap to clone; clones share the same series.
#[derive(Clone)]
pub struct RequestInstrumentation {
  inner: Arc<Inner>,
}

impl RequestInstrumentation {
  /// Register the request metrics on `registry` for `identity`.
  ///
  /// Several services may share one registry: identical definitions are
  /// reused and series are told apart by the `service` label.
  pub fn new(registry: &MetricRegistry, identity: ProcessIdentity) -> Result<Self> {
    let requests_total = registry.counter(
      HTTP_REQUESTS_TOTAL,
      "Total number of HTTP requests received",
      &[LABEL_SERVICE, LABEL_NODE, LABEL_METHOD, LABEL_ENDPOINT, LABEL_STATUS],
    )?;
    let request_duration = registry.gauge(
      HTTP_REQUEST_DURATION_SECONDS,
      "HTTP request duration (in seconds)",
      &[LABEL_SERVICE, LABEL_NODE, LABEL_METHOD, LABEL_ENDPOINT],
    )?;
    let in_progress_family = registry.gauge(
      HTTP_REQUESTS_IN_PROGRESS,
      "Number of HTTP requests currently being processed",
      &[LABEL_SERVICE, LABEL_NODE],
    )?;
    let in_progress = in_progress_family.series(
      &LabelSet::new()
        .with(LABEL_SERVICE, identity.service.as_str())
        .with(LABEL_NODE, identity.node.as_str()),
    )?;

    Ok(Self {
      inner: Arc::new(Inner {
        identity,
        requests_total,
        request_duration,
        in_progress,
      }),
    })
  }

  /// Current in-flight count for this service/node.
  pub fn in_flight(&self) -> f64 {
    self.inner.in_progress.get()
  }

  /// Start measuring one invocation.
  ///
  /// The returned guard records when completed or dropped.
  pub fn begin(&self, method: &str, endpoint: &str) -> RequestMeasurement {
    self.inner.in_progress.inc();
    RequestMeasurement {
      instrumentation: self.clone(),
      method: method.to_string(),
      endpoint: endpoint.to_string(),
      started: Instant::now(),
      status: None,
    }
  }

  /// Measure one handler future end to end and return its result untouched.
  pub async fn observe<Fut, T, E>(&self, method: &str, endpoint: &str, handler: Fut) -> std::result::Result<T, E>
  where
    Fut: Future<Output = std::result::Result<T, E>>,
    T: ResponseStatus,
  {
    let measurement = self.begin(method, endpoint);
    let result = handler.await;
    match &result {
      Ok(response) => measurement.complete(response.resolved_status()),
      Err(_) => measurement.fail(),
    }
    result
  }

  /// Wrap a handler into an instrumented handler with the same signature.
  pub fn wrap<H>(&self, handler: H) -> Instrumented<H> {
    Instrumented {
      inner: handler,
      instrumentation: self.clone(),
    }
  }

  fn request_labels(&self, method: &str, endpoint: &str) -> LabelSet {
    LabelSet::new()
      .with(LABEL_SERVICE, self.inner.identity.service.as_str())
      .with(LABEL_NODE, self.inner.identity.node.as_str())
      .with(LABEL_METHOD, method)
      .with(LABEL_ENDPOINT, endpoint)
  }

  /// Record one finished invocation.
  ///
  /// The in-flight decrement happens even when a series fails to resolve.
  fn record(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) -> Result<()> {
    let labels = self.request_labels(method, endpoint);
    let counted = self
      .inner
      .requests_total
      .inc(&labels.clone().with(LABEL_STATUS, status.to_string()));
    let timed = self
      .inner
      .request_duration
      .set(&labels, elapsed.as_secs_f64());
    self.inner.in_progress.dec();

    debug!(
      method,
      endpoint,
      status,
      elapsed_ms = elapsed.as_secs_f64() * 1_000.0,
      "Request recorded"
    );
    counted.and(timed)
  }
}

/// Measurement context of one invocation.
///
/// Never shared across requests. Dropping it without `complete` records a
/// fault (`500`, or the status attached beforehand).
pub struct RequestMeasurement {
  /// Recorder the measurement reports to.
  instrumentation: RequestInstrumentation,
  /// HTTP verb.
  method: String,
  /// Resolved endpoint label.
  endpoint: String,
  /// Monotonic start instant.
  started: Instant,
  /// Status attached so far.
  status: Option<u16>,
}

impl RequestMeasurement {
  /// Attach a status ahead of a possible fault.
  pub fn attach_status(&mut self, status: u16) {
    self.status = Some(status);
  }

  /// Finish with the resolved status of a normal return.
  pub fn complete(mut self, status: u16) {
    self.status = Some(status);
  }

  /// Finish as a fault: the attached status, else `500`.
  pub fn fail(mut self) {
    self.status = Some(self.status.unwrap_or(FAULT_STATUS));
  }
}

impl Drop for RequestMeasurement {
  fn drop(&mut self) {
    let status = self.status.unwrap_or(FAULT_STATUS);
    if std::thread::panicking() {
      warn!(
        method = %self.method,
        endpoint = %self.endpoint,
        status,
        "Handler panicked; recording fault"
      );
    }
    if let Err(e) = self
      .instrumentation
      .record(&self.method, &self.endpoint, status, self.started.elapsed())
    {
      error!(
        error = %e,
        method = %self.method,
        endpoint = %self.endpoint,
        "Request metrics could not be recorded"
      );
      // Skipped while unwinding: a second panic aborts.
      debug_assert!(
        std::thread::panicking(),
        "request metrics could not be recorded: {e}"
      );
    }
  }
}

/// A handler wrapped by `RequestInstrumentation`.
#[derive(Clone)]
pub struct Instrumented<H> {
  /// Wrapped handler.
  inner: H,
  /// Recorder.
  instrumentation: RequestInstrumentation,
}

#[async_trait]
impl<Req, H> RequestHandler<Req> for Instrumented<H>
where
  Req: InboundRequest + Send + 'static,
  H: RequestHandler<Req>,
{
  type Body = H::Body;
  type Fault = H::Fault;

  async fn handle(&self, request: Req) -> std::result::Result<Reply<H::Body>, H::Fault> {
    let method = request.method().to_string();
    let endpoint = request.endpoint().to_string();
    self
      .instrumentation
      .observe(&method, &endpoint, self.inner.handle(request))
      .await
  }
}
