//! Integration Tests - Instrumented Service End to End
//!
//! Drives the full axum router with `oneshot` and checks what lands in
//! the registry. The flight provider is a mockall mock of the
//! `FlightSource` port.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use mockall::mock;
use serde_json::Value;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

use flight_tracker_metrics::adapters::http::{AppState, build_router, track_requests};
use flight_tracker_metrics::adapters::metrics::{ExpositionEndpoint, HealthState, MetricRegistry};
use flight_tracker_metrics::domain::flight::{Flight, FlightDirection};
use flight_tracker_metrics::domain::identity::ProcessIdentity;
use flight_tracker_metrics::domain::metric::LabelSet;
use flight_tracker_metrics::usecases::dependency_instrumentation::{DependencyInstrumentation, DependencySpec};
use flight_tracker_metrics::usecases::flight_lookup::FlightLookup;
use flight_tracker_metrics::usecases::request_instrumentation::{
  HTTP_REQUESTS_IN_PROGRESS, HTTP_REQUESTS_TOTAL, RequestInstrumentation,
};
use flight_tracker_metrics::usecases::user_registry::UserRegistry;

// ---- Mock Definitions ----

mock! {
  pub Flights {}

  #[async_trait::async_trait]
  impl flight_tracker_metrics::ports::flight_source::FlightSource for Flights {
    async fn fetch_flights(
      &self,
      airport: &str,
      direction: FlightDirection,
    ) -> anyhow::Result<Vec<Flight>>;

    fn name(&self) -> &'static str;
  }
}

// ---- Helpers ----

const SERVICE: &str = "data_collector";
const NODE: &str = "node-a";

struct Harness {
  router: Router,
  registry: Arc<MetricRegistry>,
  instrumentation: RequestInstrumentation,
  users: Arc<UserRegistry>,
}

fn flight(icao24: &str) -> Flight {
  Flight {
    icao24: icao24.to_string(),
    callsign: Some("AZA123 ".to_string()),
    est_departure_airport: Some("LIRF".to_string()),
    est_arrival_airport: Some("LICC".to_string()),
    first_seen: 1_700_000_000,
    last_seen: 1_700_003_600,
  }
}

fn harness(mut source: MockFlights) -> Harness {
  source.expect_name().return_const("mock");

  let registry = Arc::new(MetricRegistry::new());
  let identity = ProcessIdentity::new(SERVICE, NODE);
  let instrumentation = RequestInstrumentation::new(&registry, identity.clone()).unwrap();
  let dependency = DependencyInstrumentation::new(&registry, identity, DependencySpec::opensky()).unwrap();
  let users = Arc::new(UserRegistry::new());

  let state = AppState {
    instrumentation: instrumentation.clone(),
    users: Arc::clone(&users),
    flights: Arc::new(FlightLookup::new(Arc::new(source), dependency)),
    health: Arc::new(HealthState::new()),
  };
  let exposition = Arc::new(ExpositionEndpoint::new(Arc::clone(&registry)));

  Harness {
    router: build_router(state, exposition, "/metrics"),
    registry,
    instrumentation,
    users,
  }
}

fn request_labels(method: &str, endpoint: &str, status: &str) -> LabelSet {
  LabelSet::new()
    .with("service", SERVICE)
    .with("node", NODE)
    .with("method", method)
    .with("endpoint", endpoint)
    .with("status", status)
}

fn requests_total(registry: &MetricRegistry, method: &str, endpoint: &str, status: &str) -> Option<f64> {
  registry.sample(HTTP_REQUESTS_TOTAL, &request_labels(method, endpoint, status))
}

async fn send(router: &Router, request: Request<Body>) -> Response {
  router.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn create_user(key: Option<&str>, body: &str) -> Request<Body> {
  let mut builder = Request::post("/users").header(header::CONTENT_TYPE, "application/json");
  if let Some(key) = key {
    builder = builder.header("Idempotency-Key", key);
  }
  builder.body(Body::from(body.to_string())).unwrap()
}

const MARIO: &str = r#"{"email":"mario.rossi@gmail.com","first_name":"Mario","last_name":"Rossi"}"#;

// ---- Flights ----

#[tokio::test]
async fn test_flight_read_records_request_and_dependency_metrics() {
  let mut source = MockFlights::new();
  source
    .expect_fetch_flights()
    .withf(|airport, direction| airport == "LICC" && *direction == FlightDirection::Departures)
    .times(1)
    .returning(|_, _| Ok(vec![flight("4b1805"), flight("300123")]));
  let h = harness(source);

  let response = send(
    &h.router,
    Request::get("/flights/licc?type=departures").body(Body::empty()).unwrap(),
  )
  .await;

  assert_eq!(response.status(), StatusCode::OK);
  let body = json_body(response).await;
  assert_eq!(body["count"], 2);
  assert_eq!(body["airport"], "LICC");
  assert_eq!(body["type"], "departures");

  assert_eq!(requests_total(&h.registry, "GET", "/flights/:airport", "200"), Some(1.0));
  let base = LabelSet::new().with("service", SERVICE).with("node", NODE);
  assert_eq!(
    h.registry.sample("opensky_api_calls_total", &base.clone().with("status", "success")),
    Some(1.0)
  );
  assert_eq!(
    h.registry.sample("flights_fetched_last_collection", &base.clone().with("airport_code", "LICC")),
    Some(2.0)
  );
  assert!(
    h.registry
      .sample("opensky_api_duration_seconds", &base.with("airport_code", "LICC"))
      .is_some()
  );
  assert_eq!(h.instrumentation.in_flight(), 0.0);
}

#[tokio::test]
async fn test_dependency_failure_answers_502_and_counts_failure() {
  let mut source = MockFlights::new();
  source
    .expect_fetch_flights()
    .returning(|_, _| Err(anyhow::anyhow!("connection reset")));
  let h = harness(source);

  let response = send(&h.router, Request::get("/flights/KJFK").body(Body::empty()).unwrap()).await;

  assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
  assert_eq!(requests_total(&h.registry, "GET", "/flights/:airport", "502"), Some(1.0));
  let failures = LabelSet::new()
    .with("service", SERVICE)
    .with("node", NODE)
    .with("status", "failure");
  assert_eq!(h.registry.sample("opensky_api_calls_total", &failures), Some(1.0));
  // No count is recorded for a failed collection.
  let gauge = LabelSet::new()
    .with("service", SERVICE)
    .with("node", NODE)
    .with("airport_code", "KJFK");
  assert_eq!(h.registry.sample("flights_fetched_last_collection", &gauge), None);
}

// ---- Users ----

#[tokio::test]
async fn test_concurrent_requests_with_same_key_create_once_and_count_twice() {
  let h = harness(MockFlights::new());

  let (a, b) = tokio::join!(
    send(&h.router, create_user(Some("fixed-test-key-123"), MARIO)),
    send(&h.router, create_user(Some("fixed-test-key-123"), MARIO)),
  );

  assert_eq!(a.status(), StatusCode::CREATED);
  assert_eq!(b.status(), StatusCode::CREATED);
  assert_eq!(json_body(a).await, json_body(b).await);
  assert_eq!(h.users.len().await, 1);
  assert_eq!(requests_total(&h.registry, "POST", "/users", "201"), Some(2.0));
  assert_eq!(h.instrumentation.in_flight(), 0.0);
}

#[tokio::test]
async fn test_new_key_for_existing_email_conflicts() {
  let h = harness(MockFlights::new());

  send(&h.router, create_user(Some("k1"), MARIO)).await;
  let response = send(&h.router, create_user(Some("k2"), MARIO)).await;

  assert_eq!(response.status(), StatusCode::CONFLICT);
  assert_eq!(requests_total(&h.registry, "POST", "/users", "201"), Some(1.0));
  assert_eq!(requests_total(&h.registry, "POST", "/users", "409"), Some(1.0));
}

#[tokio::test]
async fn test_malformed_payload_is_a_counted_400() {
  let h = harness(MockFlights::new());

  let response = send(&h.router, create_user(None, "{not json")).await;

  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(requests_total(&h.registry, "POST", "/users", "400"), Some(1.0));
}

#[tokio::test]
async fn test_user_lifecycle_uses_route_templates() {
  let h = harness(MockFlights::new());

  send(&h.router, create_user(None, MARIO)).await;
  let profile = send(
    &h.router,
    Request::get("/users/mario.rossi@gmail.com").body(Body::empty()).unwrap(),
  )
  .await;
  assert_eq!(profile.status(), StatusCode::OK);

  let link = send(
    &h.router,
    Request::post("/users/telegram")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(r#"{"email":"mario.rossi@gmail.com","telegram_chat_id":"424242"}"#))
      .unwrap(),
  )
  .await;
  assert_eq!(link.status(), StatusCode::OK);

  let missing = send(&h.router, Request::get("/users/nobody@x.io").body(Body::empty()).unwrap()).await;
  assert_eq!(missing.status(), StatusCode::NOT_FOUND);

  assert_eq!(requests_total(&h.registry, "GET", "/users/:email", "200"), Some(1.0));
  assert_eq!(requests_total(&h.registry, "GET", "/users/:email", "404"), Some(1.0));
  assert_eq!(requests_total(&h.registry, "POST", "/users/telegram", "200"), Some(1.0));
  assert_eq!(
    h.users.get("mario.rossi@gmail.com").await.unwrap().telegram_chat_id.as_deref(),
    Some("424242")
  );
}

// ---- Fallback, probes and exposition ----

#[tokio::test]
async fn test_unknown_path_is_counted_under_raw_path() {
  let h = harness(MockFlights::new());

  let response = send(&h.router, Request::get("/flights/average/LICC").body(Body::empty()).unwrap()).await;

  assert_eq!(response.status(), StatusCode::NOT_FOUND);
  assert_eq!(requests_total(&h.registry, "GET", "/flights/average/LICC", "404"), Some(1.0));
}

#[tokio::test]
async fn test_ping_is_instrumented() {
  let h = harness(MockFlights::new());

  let response = send(&h.router, Request::get("/ping").body(Body::empty()).unwrap()).await;

  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(requests_total(&h.registry, "GET", "/ping", "200"), Some(1.0));
}

#[tokio::test]
async fn test_exposition_is_stable_and_not_instrumented() {
  let h = harness(MockFlights::new());
  send(&h.router, Request::get("/ping").body(Body::empty()).unwrap()).await;

  let first = send(&h.router, Request::get("/metrics").body(Body::empty()).unwrap()).await;
  assert_eq!(first.status(), StatusCode::OK);
  assert_eq!(
    first.headers()[header::CONTENT_TYPE],
    "text/plain; version=0.0.4"
  );
  let first = to_bytes(first.into_body(), usize::MAX).await.unwrap();
  let second = send(&h.router, Request::get("/metrics").body(Body::empty()).unwrap()).await;
  let second = to_bytes(second.into_body(), usize::MAX).await.unwrap();

  assert_eq!(first, second);
  let text = String::from_utf8(first.to_vec()).unwrap();
  assert!(text.contains(HTTP_REQUESTS_TOTAL));
  assert!(text.contains(HTTP_REQUESTS_IN_PROGRESS));
  assert!(text.contains("endpoint=\"/ping\""));
  assert!(!text.contains("endpoint=\"/metrics\""));
}

// ---- Panics ----

#[tokio::test]
async fn test_panicking_handler_is_recorded_as_500() {
  let registry = Arc::new(MetricRegistry::new());
  let instrumentation = RequestInstrumentation::new(&registry, ProcessIdentity::new(SERVICE, NODE)).unwrap();

  let router: Router = Router::new()
    .route(
      "/boom",
      get(|| async {
        if true {
          panic!("handler exploded");
        }
        "unreachable"
      }),
    )
    .layer(axum::middleware::from_fn_with_state(instrumentation.clone(), track_requests))
    .layer(CatchPanicLayer::new());

  let response = router
    .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(requests_total(&registry, "GET", "/boom", "500"), Some(1.0));
  assert_eq!(instrumentation.in_flight(), 0.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mix_of_panics_keeps_exact_counts() {
  const REQUESTS: usize = 300;

  let registry = Arc::new(MetricRegistry::new());
  let instrumentation = RequestInstrumentation::new(&registry, ProcessIdentity::new(SERVICE, NODE)).unwrap();

  let router: Router = Router::new()
    .route("/ok", get(|| async { tokio::task::yield_now().await; "ok" }))
    .route(
      "/boom",
      get(|| async {
        tokio::task::yield_now().await;
        if true {
          panic!("handler exploded");
        }
        "unreachable"
      }),
    )
    .layer(axum::middleware::from_fn_with_state(instrumentation.clone(), track_requests))
    .layer(CatchPanicLayer::new());

  let handles: Vec<_> = (0..REQUESTS)
    .map(|i| {
      let path = if i % 3 == 0 { "/boom" } else { "/ok" };
      let request = Request::get(path).body(Body::empty()).unwrap();
      tokio::spawn(router.clone().oneshot(request))
    })
    .collect();

  let mut server_errors = 0;
  for handle in handles {
    let response = handle.await.unwrap().unwrap();
    if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
      server_errors += 1;
    }
  }

  assert_eq!(server_errors, REQUESTS / 3);
  assert_eq!(requests_total(&registry, "GET", "/boom", "500"), Some(100.0));
  assert_eq!(requests_total(&registry, "GET", "/ok", "200"), Some(200.0));
  assert_eq!(requests_total(&registry, "GET", "/ok", "500"), None);
  assert_eq!(instrumentation.in_flight(), 0.0);
}
