//! Application API endpoints.
//!
//! - POST /api/v1/applications - Apply to an open booking (worker)
//! - GET /api/v1/applications/my - The caller's applications (worker)
//! - GET /api/v1/applications/booking/:bookingId - Applications to a booking (customer)
//! - PUT /api/v1/applications/:id/accept - Accept and assign the worker (customer)
//! - PUT /api/v1/applications/:id/reject - Reject (customer)

use crate::server::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use crewbook_auth::{RequireCustomer, RequireWorker};
use crewbook_core::{
    AcceptedApplication, ApplicationDraft, ApplicationId, ApplicationWithBooking,
    ApplicationWithWorker, BookingApplication, BookingId,
};
use crewbook_web::{JsonBody, PathParam, WebResult};
use serde::{Deserialize, Serialize};

/// A single application plus a human-readable outcome.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationResponse {
    /// The application after the operation
    pub application: BookingApplication,
    /// Success message
    pub message: String,
}

/// A list of applications.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationsResponse<T> {
    /// Matching applications
    pub applications: Vec<T>,
    /// Number of applications returned
    pub count: usize,
}

impl<T> From<Vec<T>> for ApplicationsResponse<T> {
    fn from(applications: Vec<T>) -> Self {
        Self {
            count: applications.len(),
            applications,
        }
    }
}

/// Outcome of an acceptance.
#[derive(Debug, Serialize)]
pub struct AcceptApplicationResponse {
    /// Accepted application, assigned booking and sweep results
    #[serde(flatten)]
    pub outcome: AcceptedApplication,
    /// Success message
    pub message: String,
}

/// Apply to an open booking as the authenticated worker.
///
/// # Errors
///
/// 400 if the booking is closed, assigned, or already applied to;
/// 404 if it does not exist.
pub async fn create_application(
    State(state): State<AppState>,
    RequireWorker(claims): RequireWorker,
    JsonBody(draft): JsonBody<ApplicationDraft>,
) -> WebResult<(StatusCode, Json<ApplicationResponse>)> {
    let application = state
        .resolver
        .create_application_for_user(claims.user_id, draft)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse {
            application,
            message: "Application submitted successfully".to_string(),
        }),
    ))
}

/// The authenticated worker's applications, each with its booking.
///
/// # Errors
///
/// 500 if the store fails.
pub async fn my_applications(
    State(state): State<AppState>,
    RequireWorker(claims): RequireWorker,
) -> WebResult<Json<ApplicationsResponse<ApplicationWithBooking>>> {
    let applications = state
        .resolver
        .worker_applications_for_user(claims.user_id)
        .await?;
    Ok(Json(applications.into()))
}

/// Applications to one booking, each with the applicant's profile.
///
/// # Errors
///
/// 404 if the booking does not exist.
pub async fn booking_applications(
    State(state): State<AppState>,
    _customer: RequireCustomer,
    PathParam(booking_id): PathParam<BookingId>,
) -> WebResult<Json<ApplicationsResponse<ApplicationWithWorker>>> {
    let applications = state.resolver.booking_applications(booking_id).await?;
    Ok(Json(applications.into()))
}

/// # Errors
///
/// 400 if the application is not pending or the booking is taken,
/// 404 if either does not exist.
pub async fn accept_application(
    State(state): State<AppState>,
    _customer: RequireCustomer,
    PathParam(id): PathParam<ApplicationId>,
) -> WebResult<Json<AcceptApplicationResponse>> {
    let outcome = state.resolver.accept_application(id).await?;
    Ok(Json(AcceptApplicationResponse {
        outcome,
        message: "Application accepted and worker assigned".to_string(),
    }))
}

/// # Errors
///
/// 400 if the application is not pending, 404 if it does not exist.
pub async fn reject_application(
    State(state): State<AppState>,
    _customer: RequireCustomer,
    PathParam(id): PathParam<ApplicationId>,
) -> WebResult<Json<ApplicationResponse>> {
    let application = state.resolver.reject_application(id).await?;
    Ok(Json(ApplicationResponse {
        application,
        message: "Application rejected".to_string(),
    }))
}
