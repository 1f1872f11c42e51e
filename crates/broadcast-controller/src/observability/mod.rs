//! Health probes and metrics surface.

pub mod health;

pub use health::{health_router, HealthState};
