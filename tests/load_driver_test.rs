//! Load Driver Tests - Short Run against a Live Local Service
//!
//! Boots the instrumented router on an ephemeral port, points every
//! target URL of the driver at it, and checks both sides of the run.

use std::sync::Arc;

use mockall::mock;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use flight_tracker_metrics::adapters::http::{AppState, build_router};
use flight_tracker_metrics::adapters::load::LoadDriver;
use flight_tracker_metrics::adapters::metrics::{ExpositionEndpoint, HealthState, MetricRegistry};
use flight_tracker_metrics::config::LoadConfig;
use flight_tracker_metrics::domain::flight::{Flight, FlightDirection};
use flight_tracker_metrics::domain::identity::ProcessIdentity;
use flight_tracker_metrics::domain::metric::LabelSet;
use flight_tracker_metrics::usecases::dependency_instrumentation::{DependencyInstrumentation, DependencySpec};
use flight_tracker_metrics::usecases::flight_lookup::FlightLookup;
use flight_tracker_metrics::usecases::load_plan::LoadTask;
use flight_tracker_metrics::usecases::request_instrumentation::{HTTP_REQUESTS_TOTAL, RequestInstrumentation};
use flight_tracker_metrics::usecases::user_registry::UserRegistry;

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

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_short_run_against_local_service() {
  let mut source = MockFlights::new();
  source.expect_name().return_const("mock");
  source.expect_fetch_flights().returning(|_, _| Ok(Vec::new()));

  let registry = Arc::new(MetricRegistry::new());
  let identity = ProcessIdentity::new("user_manager", "local");
  let instrumentation = RequestInstrumentation::new(&registry, identity.clone()).unwrap();
  let dependency = DependencyInstrumentation::new(&registry, identity, DependencySpec::opensky()).unwrap();
  let users = Arc::new(UserRegistry::new());
  let state = AppState {
    instrumentation: instrumentation.clone(),
    users: Arc::clone(&users),
    flights: Arc::new(FlightLookup::new(Arc::new(source), dependency)),
    health: Arc::new(HealthState::new()),
  };
  let router = build_router(
    state,
    Arc::new(ExpositionEndpoint::new(Arc::clone(&registry))),
    "/metrics",
  );

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let base = format!("http://{}", listener.local_addr().unwrap());
  let server = tokio::spawn(async move { axum::serve(listener, router).await });

  let config = LoadConfig {
    user_manager_url: base.clone(),
    data_collector_url: base.clone(),
    ping_urls: vec![base.clone()],
    virtual_users: 3,
    requests_per_second: 200,
    duration_seconds: 2,
    think_time_ms: 10,
    ..LoadConfig::default()
  };
  let driver = LoadDriver::new(config).unwrap();
  let (_tx, rx) = broadcast::channel(1);

  let report = driver.run(rx).await.unwrap();
  server.abort();

  assert!(report.total_sent() > 0);
  assert_eq!(report.total_failed(), 0, "report:\n{report}");
  assert!(report.sent(LoadTask::FlightReads) > 0);
  assert!(report.sent(LoadTask::UserLifecycle) > 0);
  assert_eq!(instrumentation.in_flight(), 0.0);

  // Every collision request replays the first reply under the fixed key.
  if report.sent(LoadTask::IdempotencyCollision) > 0 {
    assert!(users.get("duplicate@test.com").await.is_some());
    let collisions = LabelSet::new()
      .with("service", "user_manager")
      .with("node", "local")
      .with("method", "POST")
      .with("endpoint", "/users")
      .with("status", "409");
    let lifecycle_conflicts = registry.sample(HTTP_REQUESTS_TOTAL, &collisions).unwrap_or(0.0);
    assert_eq!(lifecycle_conflicts, 0.0);
  }
}
