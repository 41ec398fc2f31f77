//! HTTP surface: liveness and metrics

pub mod health;

pub use health::{build_router, health, metrics, HealthResponse};
