//! Ready-made domain values for tests.

use chrono::{DateTime, Duration, Utc};
use crewbook_core::{
    ApplicationDraft, ApplicationId, ApplicationStatus, Booking, BookingApplication, BookingDraft,
    BookingId, CustomerId, WorkerId,
};

/// Draft for an open booking scheduled a week after `now`.
#[must_use]
pub fn open_draft(now: DateTime<Utc>) -> BookingDraft {
    BookingDraft {
        worker_id: None,
        is_open: true,
        title: "Retile bathroom floor".to_string(),
        description: "Roughly 6m², tiles supplied".to_string(),
        scheduled_date: now + Duration::days(7),
        duration_hours: 8,
        location: "42 Harbour Road".to_string(),
        notes: String::new(),
        total_cost: 480.0,
    }
}

/// Draft for a booking targeted directly at `worker_id`.
#[must_use]
pub fn direct_draft(worker_id: WorkerId, now: DateTime<Utc>) -> BookingDraft {
    BookingDraft {
        worker_id: Some(worker_id),
        is_open: false,
        ..open_draft(now)
    }
}

/// A stored-shape open booking owned by `customer_id`.
#[must_use]
pub fn open_booking(customer_id: CustomerId, now: DateTime<Utc>) -> Booking {
    open_draft(now).into_booking(customer_id, now)
}

/// A stored-shape booking directly assigned to `worker_id`.
#[must_use]
pub fn direct_booking(customer_id: CustomerId, worker_id: WorkerId, now: DateTime<Utc>) -> Booking {
    direct_draft(worker_id, now).into_booking(customer_id, now)
}

/// Application draft for `booking_id`.
#[must_use]
pub fn application_draft(booking_id: BookingId) -> ApplicationDraft {
    ApplicationDraft {
        booking_id,
        message: "Ten years of tiling, can start early".to_string(),
        proposed_price: 450.0,
    }
}

/// A stored-shape pending application.
#[must_use]
pub fn application(
    booking_id: BookingId,
    worker_id: WorkerId,
    now: DateTime<Utc>,
) -> BookingApplication {
    BookingApplication {
        id: ApplicationId::new(),
        booking_id,
        worker_id,
        message: "Available that week".to_string(),
        proposed_price: 300.0,
        status: ApplicationStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}
