//! Domain layer - Core models of the instrumented services.
//!
//! Pure data and rules: the metric model, handler replies and status
//! resolution, process identity, and the flight/user records the demo
//! services exchange. No Prometheus or HTTP types leak in here.

pub mod flight;
pub mod identity;
pub mod metric;
pub mod reply;
pub mod user;

// Re-export core types for convenience
pub use flight::{Flight, FlightDirection};
pub use identity::ProcessIdentity;
pub use metric::{LabelSet, MetricDescriptor, MetricKind};
pub use reply::{Reply, ResponseStatus};
pub use user::{NewUser, TelegramLink, User};
