//! Flight Tracker Metrics — Library Root
//!
//! Request and dependency instrumentation over a Prometheus registry,
//! the demo services that carry it, and the load driver. Re-exports all
//! modules for integration tests and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod telemetry;
pub mod usecases;
