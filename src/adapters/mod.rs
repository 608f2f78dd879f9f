//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure. Each sub-module groups adapters by concern:
//! - `flights`: OpenSky REST client (`FlightSource`)
//! - `http`: instrumented axum service surface
//! - `load`: weighted load driver
//! - `metrics`: Prometheus registry, exposition and health probes

pub mod flights;
pub mod http;
pub mod load;
pub mod metrics;
