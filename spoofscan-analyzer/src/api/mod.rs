//! HTTP API handlers for spoofscan-analyzer

pub mod analyze;
pub mod health;

pub use analyze::analyze_routes;
pub use health::health_routes;
