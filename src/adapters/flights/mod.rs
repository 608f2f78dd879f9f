//! Flight Data Adapters
//!
//! Implementations of the `FlightSource` port.

pub mod opensky;

pub use opensky::{OpenSkyClient, OpenSkyClientConfig};
