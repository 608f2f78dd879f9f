//! Load Driver - Concurrent Virtual Users against the Services
//!
//! Each virtual user owns an email and an idempotency key and walks its
//! own `LoadPlan`. All users share one `governor` limiter, so the
//! configured requests/second is a global ceiling. Collision tasks from
//! every user post the same payload under the same fixed key.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, RequestBuilder};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::report::LoadReport;
use crate::adapters::http::routes::IDEMPOTENCY_KEY_HEADER;
use crate::config::LoadConfig;
use crate::usecases::load_plan::{LoadPlan, LoadTask, RoundRobin};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Email posted by every collision request.
const COLLISION_EMAIL: &str = "duplicate@test.com";

/// Identity of one virtual user.
#[derive(Debug, Clone)]
struct Session {
  index: usize,
  email: String,
  idempotency_key: String,
}

impl Session {
  fn new(index: usize) -> Self {
    let tag = Uuid::new_v4().simple().to_string();
    Self {
      index,
      email: format!("test_{}@example.com", &tag[..8]),
      idempotency_key: Uuid::new_v4().to_string(),
    }
  }
}

/// Weighted load generator.
pub struct LoadDriver {
  /// Shared HTTP client.
  http: Client,
  /// Run settings.
  config: LoadConfig,
  /// Global pacing across users.
  limiter: Arc<DirectLimiter>,
  /// Counters filled while running.
  report: Arc<LoadReport>,
}

impl LoadDriver {
  /// Create a driver for `config`.
  pub fn new(config: LoadConfig) -> Result<Self> {
    let rate = NonZeroU32::new(config.requests_per_second)
      .context("requests_per_second must be positive")?;
    let http = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self {
      http,
      config,
      limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
      report: Arc::new(LoadReport::new()),
    })
  }

  /// Counters of the current run.
  pub fn report(&self) -> Arc<LoadReport> {
    Arc::clone(&self.report)
  }

  /// Run every virtual user until the deadline or shutdown.
  #[instrument(skip(self, shutdown_rx), fields(users = self.config.virtual_users))]
  pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<Arc<LoadReport>> {
    let deadline = Instant::now() + Duration::from_secs(self.config.duration_seconds);
    info!(
      users = self.config.virtual_users,
      rps = self.config.requests_per_second,
      duration_s = self.config.duration_seconds,
      "Load run started"
    );

    let users = (0..self.config.virtual_users).map(|i| self.virtual_user(Session::new(i), deadline));

    tokio::select! {
      _ = join_all(users) => {
        info!("Load run finished");
      }
      _ = shutdown_rx.recv() => {
        warn!("Load run interrupted");
      }
    }

    Ok(self.report())
  }

  async fn virtual_user(&self, session: Session, deadline: Instant) {
    let mut plan = LoadPlan::new();
    let mut airports = RoundRobin::new(self.config.airports.clone(), session.index);
    let think = Duration::from_millis(self.config.think_time_ms);

    debug!(user = session.index, email = %session.email, "Virtual user started");

    while Instant::now() < deadline {
      let Some(task) = plan.next_task() else { break };
      match task {
        LoadTask::HealthCheck => self.health_check().await,
        LoadTask::UserLifecycle => self.user_lifecycle(&session).await,
        LoadTask::FlightReads => {
          if let Some(airport) = airports.next_item() {
            self.flight_reads(&airport).await;
          }
        }
        LoadTask::IdempotencyCollision => self.idempotency_collision().await,
      }

      let remaining = deadline.saturating_duration_since(Instant::now());
      tokio::time::sleep(think.min(remaining)).await;
    }
  }

  async fn health_check(&self) {
    for base in &self.config.ping_urls {
      let request = self.http.get(format!("{base}/ping"));
      self.send(LoadTask::HealthCheck, request, &[200]).await;
    }
  }

  async fn user_lifecycle(&self, session: &Session) {
    let base = &self.config.user_manager_url;
    let create = self
      .http
      .post(format!("{base}/users"))
      .header(IDEMPOTENCY_KEY_HEADER, &session.idempotency_key)
      .json(&json!({
        "email": session.email,
        "first_name": "Load",
        "last_name": "User",
      }));
    self.send(LoadTask::UserLifecycle, create, &[201, 409]).await;

    let read = self.http.get(format!("{base}/users/{}", session.email));
    self.send(LoadTask::UserLifecycle, read, &[200]).await;

    let chat_id = Uuid::new_v4().as_u128() % 900_000 + 100_000;
    let link = self.http.post(format!("{base}/users/telegram")).json(&json!({
      "email": session.email,
      "telegram_chat_id": chat_id.to_string(),
    }));
    self.send(LoadTask::UserLifecycle, link, &[200]).await;
  }

  async fn flight_reads(&self, airport: &str) {
    for url in flight_read_urls(&self.config.data_collector_url, airport) {
      self.send(LoadTask::FlightReads, self.http.get(url), &[200]).await;
    }
  }

  async fn idempotency_collision(&self) {
    let request = self
      .http
      .post(format!("{}/users", self.config.user_manager_url))
      .header(IDEMPOTENCY_KEY_HEADER, &self.config.collision_key)
      .json(&json!({
        "email": COLLISION_EMAIL,
        "first_name": "Dup",
        "last_name": "User",
      }));
    self.send(LoadTask::IdempotencyCollision, request, &[201, 409]).await;
  }

  /// Pace, send, and count one request.
  async fn send(&self, task: LoadTask, request: RequestBuilder, accepted: &[u16]) {
    self.limiter.until_ready().await;

    let ok = match request.send().await {
      Ok(response) => {
        let status = response.status().as_u16();
        if !accepted.contains(&status) {
          debug!(%task, status, "Unexpected status");
        }
        accepted.contains(&status)
      }
      Err(e) => {
        debug!(%task, error = %e, "Request failed");
        false
      }
    };

    self.report.record(task, ok);
  }
}

/// Reads issued per flight task: the unfiltered list, then arrivals only.
fn flight_read_urls(base: &str, airport: &str) -> [String; 2] {
  [
    format!("{base}/flights/{airport}"),
    format!("{base}/flights/{airport}?type=arrivals"),
  ]
}
