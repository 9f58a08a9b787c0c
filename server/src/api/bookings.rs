//! Booking API endpoints.
//!
//! - POST /api/v1/bookings - Create a booking (customer)
//! - GET /api/v1/bookings/open - Open bookings (worker)
//! - GET /api/v1/bookings/user/:userId - Bookings for an account
//! - GET /api/v1/bookings/worker/:workerId - Bookings assigned to a worker
//! - GET /api/v1/bookings/:id - Booking details
//! - PUT /api/v1/bookings/:id/{accept,decline,complete,claim} - Checked transitions (worker)
//! - PATCH /api/v1/bookings/:id/status - Administrative status override
//! - DELETE /api/v1/bookings/:id - Cancel (the row is kept)

use crate::server::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use crewbook_auth::{AuthUser, RequireCustomer, RequireWorker, UserRole};
use crewbook_core::{
    Booking, BookingDraft, BookingId, BookingStatus, MarketplaceError, UserId, WorkerId,
};
use crewbook_web::{AppError, JsonBody, PathParam, WebResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// A single booking plus a human-readable outcome.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    /// The booking after the operation
    pub booking: Booking,
    /// Success message
    pub message: String,
}

impl BookingResponse {
    fn new(booking: Booking, message: &str) -> Json<Self> {
        Json(Self {
            booking,
            message: message.to_string(),
        })
    }
}

/// A list of bookings.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingsResponse {
    /// Matching bookings
    pub bookings: Vec<Booking>,
    /// Number of bookings returned
    pub count: usize,
}

impl From<Vec<Booking>> for BookingsResponse {
    fn from(bookings: Vec<Booking>) -> Self {
        Self {
            count: bookings.len(),
            bookings,
        }
    }
}

/// Optional body of a claim request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    /// Must name the authenticated worker when present
    #[serde(default)]
    pub worker_id: Option<WorkerId>,
}

/// Body of a status override.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status wire value, e.g. `"completed"`
    pub status: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a booking for the authenticated customer.
///
/// # Errors
///
/// 400 for an invalid draft, 404 if the account has no customer record.
pub async fn create_booking(
    State(state): State<AppState>,
    RequireCustomer(claims): RequireCustomer,
    JsonBody(draft): JsonBody<BookingDraft>,
) -> WebResult<(StatusCode, Json<BookingResponse>)> {
    let booking = state
        .lifecycle
        .create_booking_for_user(claims.user_id, draft)
        .await?;

    Ok((
        StatusCode::CREATED,
        BookingResponse::new(booking, "Booking created successfully"),
    ))
}

/// Bookings any worker may still claim or apply to.
///
/// # Errors
///
/// 500 if the store fails.
pub async fn open_bookings(
    State(state): State<AppState>,
    _worker: RequireWorker,
) -> WebResult<Json<BookingsResponse>> {
    let bookings = state.lifecycle.open_bookings().await?;
    Ok(Json(bookings.into()))
}

/// Bookings belonging to `user_id`, read according to the caller's role.
///
/// Customers see the bookings they posted, workers the ones assigned to
/// them. Admin callers get whichever profile `user_id` has.
///
/// # Errors
///
/// 404 if `user_id` has no matching profile.
pub async fn user_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(user_id): PathParam<UserId>,
) -> WebResult<Json<BookingsResponse>> {
    let lifecycle = &state.lifecycle;

    let bookings = match user.role() {
        UserRole::Customer => lifecycle.customer_bookings_for_user(user_id).await?,
        UserRole::Worker => lifecycle.worker_bookings_for_user(user_id).await?,
        UserRole::Admin => match lifecycle.customer_bookings_for_user(user_id).await {
            Err(MarketplaceError::ProfileNotFound { .. }) => {
                lifecycle.worker_bookings_for_user(user_id).await?
            }
            other => other?,
        },
    };

    Ok(Json(bookings.into()))
}

/// Bookings assigned to a worker record.
///
/// # Errors
///
/// 500 if the store fails.
pub async fn worker_bookings(
    State(state): State<AppState>,
    _user: AuthUser,
    PathParam(worker_id): PathParam<WorkerId>,
) -> WebResult<Json<BookingsResponse>> {
    let bookings = state.lifecycle.worker_bookings(worker_id).await?;
    Ok(Json(bookings.into()))
}

/// # Errors
///
/// 404 if the booking does not exist.
pub async fn get_booking(
    State(state): State<AppState>,
    _user: AuthUser,
    PathParam(id): PathParam<BookingId>,
) -> WebResult<Json<Booking>> {
    Ok(Json(state.lifecycle.get_booking(id).await?))
}

/// `pending` → `accepted`.
///
/// # Errors
///
/// 400 if the booking is not pending, 404 if it does not exist.
pub async fn accept_booking(
    State(state): State<AppState>,
    _worker: RequireWorker,
    PathParam(id): PathParam<BookingId>,
) -> WebResult<Json<BookingResponse>> {
    let booking = state.lifecycle.accept_booking(id).await?;
    Ok(BookingResponse::new(booking, "Booking accepted"))
}

/// `pending` → `declined`.
///
/// # Errors
///
/// 400 if the booking is not pending, 404 if it does not exist.
pub async fn decline_booking(
    State(state): State<AppState>,
    _worker: RequireWorker,
    PathParam(id): PathParam<BookingId>,
) -> WebResult<Json<BookingResponse>> {
    let booking = state.lifecycle.decline_booking(id).await?;
    Ok(BookingResponse::new(booking, "Booking declined"))
}

/// `accepted` → `completed`.
///
/// # Errors
///
/// 400 if the booking is not accepted, 404 if it does not exist.
pub async fn complete_booking(
    State(state): State<AppState>,
    _worker: RequireWorker,
    PathParam(id): PathParam<BookingId>,
) -> WebResult<Json<BookingResponse>> {
    let booking = state.lifecycle.complete_booking(id).await?;
    Ok(BookingResponse::new(booking, "Booking completed"))
}

/// Take an open booking directly.
///
/// The claimant is always the authenticated worker; a body `workerId`
/// naming anyone else is refused.
///
/// # Errors
///
/// 403 on a mismatched `workerId`, 400 if someone else got there first,
/// 404 if the booking does not exist.
pub async fn claim_booking(
    State(state): State<AppState>,
    RequireWorker(claims): RequireWorker,
    PathParam(id): PathParam<BookingId>,
    body: Option<Json<ClaimRequest>>,
) -> WebResult<Json<BookingResponse>> {
    let worker_id = state.lifecycle.resolve_worker(claims.user_id).await?;

    let requested = body.and_then(|Json(request)| request.worker_id);
    if requested.is_some_and(|requested| requested != worker_id) {
        return Err(AppError::forbidden(
            "Workers can only claim bookings for themselves",
        ));
    }

    let booking = state.lifecycle.claim_open_booking(id, worker_id).await?;
    Ok(BookingResponse::new(booking, "Booking claimed successfully"))
}

/// Force a status with no transition checks.
///
/// # Errors
///
/// 400 for an unknown status, 404 if the booking does not exist.
pub async fn update_booking_status(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<BookingId>,
    JsonBody(request): JsonBody<UpdateStatusRequest>,
) -> WebResult<Json<BookingResponse>> {
    let status: BookingStatus = request.status.parse()?;
    tracing::info!(booking_id = %id, user_id = %user.user_id(), to = %status, "Status override requested");

    let booking = state
        .lifecycle
        .status_override()
        .update_booking_status(id, status)
        .await?;
    Ok(BookingResponse::new(booking, "Booking status updated"))
}

/// `pending` | `accepted` → `cancelled`.
///
/// # Errors
///
/// 400 if the booking already reached a terminal status, 404 if it does not exist.
pub async fn cancel_booking(
    State(state): State<AppState>,
    _user: AuthUser,
    PathParam(id): PathParam<BookingId>,
) -> WebResult<Json<BookingResponse>> {
    let booking = state.lifecycle.cancel_booking(id).await?;
    Ok(BookingResponse::new(booking, "Booking cancelled"))
}
