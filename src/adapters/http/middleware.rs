//! Request Tracking Middleware - axum Binding of RequestInstrumentation
//!
//! Mounted with `axum::middleware::from_fn_with_state` on every service
//! route and on the fallback. The endpoint label is the matched route
//! template (`/users/:email`); unmatched requests use the raw path.

use axum::extract::{MatchedPath, Request, State};
use axum::http;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::domain::reply::{Reply, ResponseStatus, resolve_status};
use crate::ports::handler::InboundRequest;
use crate::usecases::request_instrumentation::RequestInstrumentation;

/// Measure one request end to end.
///
/// A panic in the inner service unwinds through here: the measurement
/// guard records a `500` and the panic keeps propagating to the outer
/// catch-panic layer.
pub async fn track_requests(
  State(instrumentation): State<RequestInstrumentation>,
  request: Request,
  next: Next,
) -> Response {
  let measurement = instrumentation.begin(request.method().as_str(), request.endpoint());
  let response = next.run(request).await;
  measurement.complete(response.resolved_status());
  response
}

impl<B> InboundRequest for http::Request<B> {
  fn method(&self) -> &str {
    self.method().as_str()
  }

  fn route(&self) -> Option<&str> {
    self.extensions().get::<MatchedPath>().map(MatchedPath::as_str)
  }

  fn path(&self) -> &str {
    self.uri().path()
  }
}

impl<B> ResponseStatus for http::Response<B> {
  fn explicit_status(&self) -> Option<u16> {
    Some(self.status().as_u16())
  }
}

impl<B: IntoResponse> IntoResponse for Reply<B> {
  fn into_response(self) -> Response {
    let (body, status) = self.into_parts();
    let status = http::StatusCode::from_u16(resolve_status(status))
      .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
    (status, body).into_response()
  }
}
