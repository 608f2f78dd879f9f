//! Flight records returned by the flight data dependency.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of an airport's traffic to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightDirection {
    /// Flights landing at the airport.
    #[default]
    Arrivals,
    /// Flights leaving the airport.
    Departures,
}

impl FlightDirection {
    /// Path segment used by the OpenSky flights API.
    pub fn api_segment(&self) -> &'static str {
        match self {
            Self::Arrivals => "arrival",
            Self::Departures => "departure",
        }
    }
}

impl fmt::Display for FlightDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arrivals => write!(f, "arrivals"),
            Self::Departures => write!(f, "departures"),
        }
    }
}

/// One tracked flight, as reported by OpenSky.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    /// ICAO 24-bit transponder address.
    pub icao24: String,
    /// Callsign, padded by OpenSky; may be absent.
    #[serde(default)]
    pub callsign: Option<String>,
    /// Estimated departure airport (ICAO).
    #[serde(default)]
    pub est_departure_airport: Option<String>,
    /// Estimated arrival airport (ICAO).
    #[serde(default)]
    pub est_arrival_airport: Option<String>,
    /// First time the aircraft was seen (Unix seconds).
    pub first_seen: i64,
    /// Last time the aircraft was seen (Unix seconds).
    pub last_seen: i64,
}

/// Normalise an airport code to upper-case ICAO form.
pub fn normalize_airport_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
