//! Application state for the Crewbook HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Booking Lifecycle Engine and Application Resolution Engine
//! - Token verifier (for the auth extractors)
//! - Readiness probe (for `/ready`)

use axum::extract::FromRef;
use crewbook_auth::JwtService;
use crewbook_core::{ApplicationResolver, BookingLifecycle};
use crewbook_web::handlers::ReadinessProbe;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply, everything is behind `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Booking state machine
    pub lifecycle: BookingLifecycle,

    /// Application accept/reject protocol
    pub resolver: ApplicationResolver,

    /// Bearer token verification
    pub jwt: Arc<JwtService>,

    /// Dependency check behind `/ready`
    pub readiness: Arc<dyn ReadinessProbe>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        lifecycle: BookingLifecycle,
        resolver: ApplicationResolver,
        jwt: Arc<JwtService>,
        readiness: Arc<dyn ReadinessProbe>,
    ) -> Self {
        Self {
            lifecycle,
            resolver,
            jwt,
            readiness,
        }
    }
}

// Lets the auth extractors find the verifier.
impl FromRef<AppState> for Arc<JwtService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.jwt.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ReadinessProbe> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.readiness.clone()
    }
}
