//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) the use cases need from the outside
//! world. Adapters implement these traits.
//!
//! Port categories:
//! - `RequestHandler`: any `(request) -> Result<Reply, Fault>` handler
//! - `FlightSource`: external flight data provider (OpenSky)

pub mod flight_source;
pub mod handler;

pub use flight_source::FlightSource;
pub use handler::{HandlerFn, InboundRequest, RequestHandler, handler_fn};
