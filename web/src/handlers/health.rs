//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Overall health of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Cannot serve requests.
    Unhealthy,
}

/// Result of probing one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    /// Component name, e.g. `"database"`.
    pub component: String,
    /// Probe outcome.
    pub status: HealthStatus,
    /// Human-readable detail.
    pub message: String,
}

impl HealthCheck {
    /// A passing check.
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        let component = component.into();
        Self {
            message: format!("{component} is reachable"),
            component,
            status: HealthStatus::Healthy,
        }
    }

    /// A failing check.
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: message.into(),
        }
    }
}

/// Something the service cannot work without.
pub trait ReadinessProbe: Send + Sync {
    /// Check the dependency once.
    fn check(&self) -> Pin<Box<dyn Future<Output = HealthCheck> + Send + '_>>;
}

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check: 200 when the probe passes, 503 otherwise.
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
///
/// # Response
///
/// ```json
/// {
///   "component": "database",
///   "status": "Healthy",
///   "message": "database is reachable"
/// }
/// ```
pub async fn readiness_check(
    State(probe): State<Arc<dyn ReadinessProbe>>,
) -> (StatusCode, Json<HealthCheck>) {
    let health = probe.check().await;

    let status = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => {
            tracing::warn!(component = %health.component, message = %health.message, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    (status, Json(health))
}
