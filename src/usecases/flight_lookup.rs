//! Flight Lookup - Instrumented Flight Data Collection
//!
//! Fetches flights for an airport through the `FlightSource` port and
//! reports the call to `DependencyInstrumentation`: call duration and
//! outcome per airport, then the number of flights fetched.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, instrument, warn};

use crate::domain::flight::{Flight, FlightDirection, normalize_airport_code};
use crate::ports::flight_source::FlightSource;
use crate::usecases::dependency_instrumentation::DependencyInstrumentation;

/// Flight collection use case of the data collector.
pub struct FlightLookup {
  /// External flight data provider.
  source: Arc<dyn FlightSource>,
  /// Recorder for the provider's metrics.
  metrics: DependencyInstrumentation,
}

impl FlightLookup {
  /// Create a lookup over `source`.
  pub fn new(source: Arc<dyn FlightSource>, metrics: DependencyInstrumentation) -> Self {
    Self { source, metrics }
  }

  /// Fetch flights for `airport`, recording the dependency call.
  ///
  /// The provider's error is returned as-is after being counted.
  #[instrument(skip(self), fields(provider = self.source.name()))]
  pub async fn collect(&self, airport: &str, direction: FlightDirection) -> Result<Vec<Flight>> {
    let airport = normalize_airport_code(airport);
    let flights = self
      .metrics
      .time_call(&airport, self.source.fetch_flights(&airport, direction))
      .await
      .inspect_err(|e| warn!(airport = %airport, error = %e, "Flight source call failed"))?;

    let fetched = f64::from(u32::try_from(flights.len()).unwrap_or(u32::MAX));
    if let Err(e) = self.metrics.record_domain_gauge(&airport, fetched) {
      error!(error = %e, airport = %airport, "Flight count could not be recorded");
    }

    info!(
      airport = %airport,
      direction = %direction,
      flights = flights.len(),
      "Flights collected"
    );
    Ok(flights)
  }
}
