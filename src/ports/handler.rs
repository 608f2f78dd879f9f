//! Request Handler Port - Framework-neutral Handler Interface
//!
//! Any request handler is `(request) -> Result<Reply, Fault>`. The
//! instrumentation middleware wraps one handler into another with the same
//! signature, so wrappers compose by plain nesting.

use std::future::Future;

use async_trait::async_trait;

use crate::domain::reply::Reply;

/// What the instrumentation needs to know about an inbound request.
pub trait InboundRequest {
  /// HTTP verb, e.g. `GET`.
  fn method(&self) -> &str;

  /// Logical route identifier, when routing matched one.
  fn route(&self) -> Option<&str>;

  /// Raw request path.
  fn path(&self) -> &str;

  /// Endpoint label: the matched route, else the raw path.
  fn endpoint(&self) -> &str {
    self.route().unwrap_or_else(|| self.path())
  }
}

/// A request handler returning a `Reply` or a fault.
#[async_trait]
pub trait RequestHandler<Req>: Send + Sync
where
  Req: Send + 'static,
{
  /// Reply body type.
  type Body: Send + 'static;
  /// Fault type, propagated unchanged by wrappers.
  type Fault: Send + 'static;

  /// Handle one request.
  async fn handle(&self, request: Req) -> Result<Reply<Self::Body>, Self::Fault>;
}

/// Adapter turning an async closure into a `RequestHandler`.
#[derive(Clone)]
pub struct HandlerFn<F> {
  f: F,
}

/// Build a handler from `Fn(Req) -> impl Future<Output = Result<Reply<B>, E>>`.
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
  HandlerFn { f }
}

#[async_trait]
impl<Req, F, Fut, B, E> RequestHandler<Req> for HandlerFn<F>
where
  Req: Send + 'static,
  F: Fn(Req) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Reply<B>, E>> + Send + 'static,
  B: Send + 'static,
  E: Send + 'static,
{
  type Body = B;
  type Fault = E;

  async fn handle(&self, request: Req) -> Result<Reply<B>, E> {
    (self.f)(request).await
  }
}
