//! Ingestion and performance analytics for school standardized-testing
//! indicators: load the stage exports, keep them in an immutable store, and
//! build school and municipality reports on demand.

pub mod config;
pub mod error;
pub mod indicators;
pub mod infrastructure;
pub mod performance;
pub mod report;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod upgrades;

pub use service::PerformanceService;
pub use store::IndicatorStore;
