//! Synthetic Load Adapters
//!
//! HTTP load driver for the instrumented services and its report.

pub mod driver;
pub mod report;

pub use driver::LoadDriver;
pub use report::{LoadReport, TaskSummary};
