//! OpenSky Client - Airport Arrivals/Departures over REST
//!
//! Queries `/flights/{arrival|departure}?airport=..&begin=..&end=..` for
//! a trailing window ending now. OpenSky answers `404` when nothing
//! matched the window; that is an empty result, not a failure.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::OpenSkyConfig;
use crate::domain::flight::{Flight, FlightDirection};
use crate::ports::flight_source::FlightSource;

/// Configuration for the OpenSky client.
#[derive(Debug, Clone)]
pub struct OpenSkyClientConfig {
  /// API base URL, without trailing slash.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Width of the queried window.
  pub lookback: chrono::Duration,
}

impl Default for OpenSkyClientConfig {
  fn default() -> Self {
    Self::from(&OpenSkyConfig::default())
  }
}

impl From<&OpenSkyConfig> for OpenSkyClientConfig {
  fn from(config: &OpenSkyConfig) -> Self {
    Self {
      base_url: config.base_url.trim_end_matches('/').to_string(),
      timeout: Duration::from_millis(config.timeout_ms),
      lookback: chrono::Duration::hours(i64::from(config.lookback_hours)),
    }
  }
}

/// REST client for the OpenSky flights API.
pub struct OpenSkyClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: OpenSkyClientConfig,
}

impl OpenSkyClient {
  /// Create a new OpenSky client.
  pub fn new(config: OpenSkyClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http, config })
  }

  /// URL for one airport and direction, without the query string.
  fn endpoint(&self, direction: FlightDirection) -> String {
    format!("{}/flights/{}", self.config.base_url, direction.api_segment())
  }
}

#[async_trait]
impl FlightSource for OpenSkyClient {
  async fn fetch_flights(&self, airport: &str, direction: FlightDirection) -> Result<Vec<Flight>> {
    let end = Utc::now().timestamp();
    let begin = end - self.config.lookback.num_seconds();
    let url = self.endpoint(direction);

    debug!(%url, airport, begin, end, "Querying OpenSky");

    let response = self
      .http
      .get(&url)
      .query(&[
        ("airport", airport.to_string()),
        ("begin", begin.to_string()),
        ("end", end.to_string()),
      ])
      .send()
      .await
      .with_context(|| format!("OpenSky request failed for {airport}"))?;

    match response.status() {
      StatusCode::NOT_FOUND => {
        debug!(airport, "No flights in window");
        Ok(Vec::new())
      }
      status if status.is_success() => response
        .json::<Vec<Flight>>()
        .await
        .context("Failed to decode OpenSky flights"),
      status => {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, airport, "OpenSky error response");
        Err(anyhow::anyhow!("OpenSky error {status}: {body}"))
      }
    }
  }

  fn name(&self) -> &'static str {
    "opensky"
  }
}
