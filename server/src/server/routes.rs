//! Router configuration for the Crewbook API.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::{applications, bookings};
use crate::config::ServerConfig;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post, put},
};
use crewbook_web::{
    CORRELATION_ID_HEADER, correlation_id,
    handlers::{health_check, readiness_check},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the complete Axum router.
///
/// - `/health` and `/ready` (no authentication)
/// - booking and application endpoints under `/api/v1`
///
/// Every request gets a correlation id, a trace span, CORS handling and
/// the configured timeout.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        // Bookings
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/open", get(bookings::open_bookings))
        .route("/bookings/user/:user_id", get(bookings::user_bookings))
        .route("/bookings/worker/:worker_id", get(bookings::worker_bookings))
        .route(
            "/bookings/:id",
            get(bookings::get_booking).delete(bookings::cancel_booking),
        )
        .route("/bookings/:id/accept", put(bookings::accept_booking))
        .route("/bookings/:id/decline", put(bookings::decline_booking))
        .route("/bookings/:id/complete", put(bookings::complete_booking))
        .route("/bookings/:id/claim", put(bookings::claim_booking))
        .route("/bookings/:id/status", patch(bookings::update_booking_status))
        // Applications
        .route("/applications", post(applications::create_application))
        .route("/applications/my", get(applications::my_applications))
        .route(
            "/applications/booking/:booking_id",
            get(applications::booking_applications),
        )
        .route(
            "/applications/:id/accept",
            put(applications::accept_application),
        )
        .route(
            "/applications/:id/reject",
            put(applications::reject_application),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api/v1", api_routes)
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(correlation_id))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(CORRELATION_ID_HEADER),
        ])
        .allow_credentials(true)
}
