//! Row shapes and their conversion into domain values.

use chrono::{DateTime, Utc};
use crewbook_core::{
    ApplicationId, ApplicationStatus, Booking, BookingApplication, BookingId, BookingStatus,
    CustomerId, StoreError, WorkerId,
};
use uuid::Uuid;

pub(crate) const BOOKING_COLUMNS: &str = "id, customer_id, worker_id, is_open, title, \
    description, scheduled_date, duration_hours, location, notes, total_cost, status, \
    created_at, updated_at";

pub(crate) const APPLICATION_COLUMNS: &str =
    "id, booking_id, worker_id, message, proposed_price, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: Uuid,
    customer_id: Uuid,
    worker_id: Option<Uuid>,
    is_open: bool,
    title: String,
    description: String,
    scheduled_date: DateTime<Utc>,
    duration_hours: i32,
    location: String,
    notes: String,
    total_cost: f64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status: BookingStatus = row.status.parse().map_err(|_| {
            StoreError::CorruptRecord(format!("booking {} has status {:?}", row.id, row.status))
        })?;
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            worker_id: row.worker_id.map(WorkerId::from_uuid),
            is_open: row.is_open,
            title: row.title,
            description: row.description,
            scheduled_date: row.scheduled_date,
            duration_hours: row.duration_hours,
            location: row.location,
            notes: row.notes,
            total_cost: row.total_cost,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ApplicationRow {
    id: Uuid,
    booking_id: Uuid,
    worker_id: Uuid,
    message: String,
    proposed_price: f64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for BookingApplication {
    type Error = StoreError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let status: ApplicationStatus = row.status.parse().map_err(|_| {
            StoreError::CorruptRecord(format!(
                "application {} has status {:?}",
                row.id, row.status
            ))
        })?;
        Ok(Self {
            id: ApplicationId::from_uuid(row.id),
            booking_id: BookingId::from_uuid(row.booking_id),
            worker_id: WorkerId::from_uuid(row.worker_id),
            message: row.message,
            proposed_price: row.proposed_price,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}
