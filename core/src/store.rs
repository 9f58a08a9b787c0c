//! Persistence traits for bookings and applications.
//!
//! # Guarded Writes
//!
//! Assignment and status changes are compare-and-swap operations: the
//! store applies the write only if a predicate over the *current* row still
//! holds, and reports whether it did. The engines never read, check in
//! memory, and then write unconditionally.
//!
//! | Operation | Predicate |
//! |---|---|
//! | [`BookingStore::claim_open`] | `is_open AND worker_id IS NULL AND status = 'pending'` |
//! | [`BookingStore::release_claim`] | `worker_id = $worker AND status = 'pending'` |
//! | [`BookingStore::transition_status`] | `status = from` |
//! | [`ApplicationStore::transition_status`] | `status = from` |
//!
//! Whenever a booking leaves `pending` its `is_open` flag is cleared in the
//! same write, so an open booking is always pending.
//!
//! # Dyn Compatibility
//!
//! Like every trait in this crate, these return explicit
//! `Pin<Box<dyn Future>>` values instead of `async fn` so the engines can
//! hold them as `Arc<dyn BookingStore>`.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

use crate::application::{ApplicationStatus, BookingApplication};
use crate::booking::{Booking, BookingStatus};
use crate::error::StoreError;
use crate::types::{ApplicationId, BookingId, CustomerId, WorkerId};

/// Boxed future returned by store and identity operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Durable record of bookings.
pub trait BookingStore: Send + Sync {
    /// Persist a new booking.
    fn insert(&self, booking: Booking) -> StoreFuture<'_, ()>;

    /// Look a booking up by id.
    fn find_by_id(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>>;

    /// Bookings owned by a customer, latest scheduled date first.
    fn find_by_customer(&self, customer_id: CustomerId) -> StoreFuture<'_, Vec<Booking>>;

    /// Bookings assigned to a worker, latest scheduled date first.
    fn find_by_worker(&self, worker_id: WorkerId) -> StoreFuture<'_, Vec<Booking>>;

    /// Open, unassigned, pending bookings, newest first.
    fn find_open(&self) -> StoreFuture<'_, Vec<Booking>>;

    /// Move a booking from `from` to `to` if it is still in `from`.
    ///
    /// Returns `false` when the booking is missing or its status changed.
    fn transition_status(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool>;

    /// Write `to` without looking at the current status.
    ///
    /// Returns `false` when the booking is missing.
    fn overwrite_status(
        &self,
        id: BookingId,
        to: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool>;

    /// Assign `worker_id` and close the booking if it is still open,
    /// unassigned and pending.
    ///
    /// Returns `true` for exactly one of any number of concurrent callers.
    fn claim_open(
        &self,
        id: BookingId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool>;

    /// Undo a claim by `worker_id`: clear the worker and reopen the booking,
    /// if it is still pending and still assigned to that worker.
    fn release_claim(
        &self,
        id: BookingId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool>;
}

/// Durable record of applications, unique per `(booking, worker)`.
pub trait ApplicationStore: Send + Sync {
    /// Persist a new application.
    ///
    /// Fails with [`StoreError::UniqueViolation`] if the worker already
    /// applied to the booking.
    fn insert(&self, application: BookingApplication) -> StoreFuture<'_, ()>;

    /// Look an application up by id.
    fn find_by_id(&self, id: ApplicationId) -> StoreFuture<'_, Option<BookingApplication>>;

    /// Applications to a booking, newest first.
    fn find_by_booking(&self, booking_id: BookingId) -> StoreFuture<'_, Vec<BookingApplication>>;

    /// Applications from a worker, newest first.
    fn find_by_worker(&self, worker_id: WorkerId) -> StoreFuture<'_, Vec<BookingApplication>>;

    /// Whether `worker_id` has applied to `booking_id`.
    fn exists_for(&self, booking_id: BookingId, worker_id: WorkerId) -> StoreFuture<'_, bool>;

    /// Move an application from `from` to `to` if it is still in `from`.
    fn transition_status(
        &self,
        id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool>;
}
