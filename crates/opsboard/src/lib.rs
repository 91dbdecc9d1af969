pub mod comments;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod telemetry;
