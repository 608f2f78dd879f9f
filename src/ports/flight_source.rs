//! Flight Source Port - External Flight Data Interface
//!
//! The data collector's only outbound dependency. Implemented by the
//! OpenSky REST client; mocked in tests.

use async_trait::async_trait;

use crate::domain::flight::{Flight, FlightDirection};

/// Provider of recent flights for an airport.
#[async_trait]
pub trait FlightSource: Send + Sync + 'static {
  /// Flights arriving at or departing from `airport` (ICAO code)
  /// within the provider's lookback window.
  async fn fetch_flights(
    &self,
    airport: &str,
    direction: FlightDirection,
  ) -> anyhow::Result<Vec<Flight>>;

  /// Short provider name for logs.
  fn name(&self) -> &'static str;
}
