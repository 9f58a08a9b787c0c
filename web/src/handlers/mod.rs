//! HTTP request handlers shared by every Crewbook service.

pub mod health;

pub use health::{HealthCheck, HealthStatus, ReadinessProbe, health_check, readiness_check};
