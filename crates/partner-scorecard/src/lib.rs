pub mod config;
pub mod error;
pub mod scorecard;
pub mod telemetry;
