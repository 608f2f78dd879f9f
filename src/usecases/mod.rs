//! Use Cases Layer - Application Logic
//!
//! Orchestrates domain types with ports and the metric registry to
//! implement the services' workflows.
//!
//! Use cases:
//! - `RequestInstrumentation`: per-request count, duration, in-flight
//! - `DependencyInstrumentation`: explicit outbound call metrics
//! - `FlightLookup`: instrumented flight collection (data collector)
//! - `UserRegistry`: idempotent user creation (user manager)
//! - `LoadPlan`: weighted scenario mix for the load driver

pub mod dependency_instrumentation;
pub mod flight_lookup;
pub mod load_plan;
pub mod request_instrumentation;
pub mod user_registry;

pub use dependency_instrumentation::{DependencyInstrumentation, DependencySpec};
pub use flight_lookup::FlightLookup;
pub use load_plan::{LoadPlan, LoadTask};
pub use request_instrumentation::{Instrumented, RequestInstrumentation, RequestMeasurement};
pub use user_registry::UserRegistry;
