//! In-memory stores.
//!
//! Each guarded write checks its predicate and applies the change while
//! holding the same lock, which gives the compare-and-swap semantics the
//! engines rely on.

use chrono::{DateTime, Utc};
use crewbook_core::{
    ApplicationId, ApplicationStatus, ApplicationStore, Booking, BookingApplication, BookingId,
    BookingStatus, BookingStore, CustomerId, StoreError, StoreFuture, WorkerId,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::DatabaseError("in-memory store lock poisoned".to_string()))
}

/// In-memory [`BookingStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    bookings: Arc<Mutex<HashMap<BookingId, Booking>>>,
}

impl InMemoryBookingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a booking, bypassing the trait.
    #[must_use]
    pub fn get(&self, id: BookingId) -> Option<Booking> {
        self.bookings.lock().ok()?.get(&id).cloned()
    }

    /// Number of stored bookings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bookings.lock().map(|b| b.len()).unwrap_or_default()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sorted_by<F>(&self, filter: F, newest_created: bool) -> Result<Vec<Booking>, StoreError>
    where
        F: Fn(&Booking) -> bool,
    {
        let mut found: Vec<Booking> = lock(&self.bookings)?
            .values()
            .filter(|b| filter(b))
            .cloned()
            .collect();
        if newest_created {
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        } else {
            found.sort_by(|a, b| b.scheduled_date.cmp(&a.scheduled_date));
        }
        Ok(found)
    }
}

fn set_status(booking: &mut Booking, to: BookingStatus, at: DateTime<Utc>) {
    booking.status = to;
    if to != BookingStatus::Pending {
        booking.is_open = false;
    }
    booking.updated_at = at;
}

impl BookingStore for InMemoryBookingStore {
    fn insert(&self, booking: Booking) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut bookings = lock(&self.bookings)?;
            if bookings.contains_key(&booking.id) {
                return Err(StoreError::UniqueViolation(format!(
                    "booking {} already exists",
                    booking.id
                )));
            }
            bookings.insert(booking.id, booking);
            Ok(())
        })
    }

    fn find_by_id(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move { Ok(lock(&self.bookings)?.get(&id).cloned()) })
    }

    fn find_by_customer(&self, customer_id: CustomerId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move { self.sorted_by(|b| b.customer_id == customer_id, false) })
    }

    fn find_by_worker(&self, worker_id: WorkerId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move { self.sorted_by(|b| b.worker_id == Some(worker_id), false) })
    }

    fn find_open(&self) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move { self.sorted_by(Booking::is_claimable, true) })
    }

    fn transition_status(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut bookings = lock(&self.bookings)?;
            match bookings.get_mut(&id) {
                Some(booking) if booking.status == from => {
                    set_status(booking, to, at);
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn overwrite_status(
        &self,
        id: BookingId,
        to: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut bookings = lock(&self.bookings)?;
            let Some(booking) = bookings.get_mut(&id) else {
                return Ok(false);
            };
            set_status(booking, to, at);
            Ok(true)
        })
    }

    fn claim_open(
        &self,
        id: BookingId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut bookings = lock(&self.bookings)?;
            match bookings.get_mut(&id) {
                Some(booking) if booking.is_claimable() => {
                    booking.worker_id = Some(worker_id);
                    booking.is_open = false;
                    booking.updated_at = at;
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn release_claim(
        &self,
        id: BookingId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut bookings = lock(&self.bookings)?;
            match bookings.get_mut(&id) {
                Some(booking)
                    if booking.worker_id == Some(worker_id)
                        && booking.status == BookingStatus::Pending =>
                {
                    booking.worker_id = None;
                    booking.is_open = true;
                    booking.updated_at = at;
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }
}

/// In-memory [`ApplicationStore`] with a `(booking, worker)` uniqueness check.
///
/// Status writes for selected ids can be made to fail, to exercise the
/// best-effort sibling sweep.
#[derive(Debug, Clone, Default)]
pub struct InMemoryApplicationStore {
    applications: Arc<Mutex<HashMap<ApplicationId, BookingApplication>>>,
    failing: Arc<Mutex<HashSet<ApplicationId>>>,
}

impl InMemoryApplicationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of an application, bypassing the trait.
    #[must_use]
    pub fn get(&self, id: ApplicationId) -> Option<BookingApplication> {
        self.applications.lock().ok()?.get(&id).cloned()
    }

    /// Make every status write to `id` fail with a database error.
    pub fn fail_status_writes_for(&self, id: ApplicationId) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(id);
        }
    }

    /// Stop failing status writes to `id`.
    pub fn heal_status_writes_for(&self, id: ApplicationId) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(&id);
        }
    }

    fn sorted_by<F>(&self, filter: F) -> Result<Vec<BookingApplication>, StoreError>
    where
        F: Fn(&BookingApplication) -> bool,
    {
        let mut found: Vec<BookingApplication> = lock(&self.applications)?
            .values()
            .filter(|a| filter(a))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

impl ApplicationStore for InMemoryApplicationStore {
    fn insert(&self, application: BookingApplication) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut applications = lock(&self.applications)?;
            let duplicate = applications.values().any(|a| {
                a.booking_id == application.booking_id && a.worker_id == application.worker_id
            });
            if duplicate {
                return Err(StoreError::UniqueViolation(format!(
                    "worker {} already applied to booking {}",
                    application.worker_id, application.booking_id
                )));
            }
            applications.insert(application.id, application);
            Ok(())
        })
    }

    fn find_by_id(&self, id: ApplicationId) -> StoreFuture<'_, Option<BookingApplication>> {
        Box::pin(async move { Ok(lock(&self.applications)?.get(&id).cloned()) })
    }

    fn find_by_booking(&self, booking_id: BookingId) -> StoreFuture<'_, Vec<BookingApplication>> {
        Box::pin(async move { self.sorted_by(|a| a.booking_id == booking_id) })
    }

    fn find_by_worker(&self, worker_id: WorkerId) -> StoreFuture<'_, Vec<BookingApplication>> {
        Box::pin(async move { self.sorted_by(|a| a.worker_id == worker_id) })
    }

    fn exists_for(&self, booking_id: BookingId, worker_id: WorkerId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            Ok(lock(&self.applications)?
                .values()
                .any(|a| a.booking_id == booking_id && a.worker_id == worker_id))
        })
    }

    fn transition_status(
        &self,
        id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            if lock(&self.failing)?.contains(&id) {
                return Err(StoreError::DatabaseError(format!(
                    "injected failure writing application {id}"
                )));
            }
            let mut applications = lock(&self.applications)?;
            match applications.get_mut(&id) {
                Some(application) if application.status == from => {
                    application.status = to;
                    application.updated_at = at;
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }
}
