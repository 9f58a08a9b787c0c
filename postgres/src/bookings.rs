//! `PostgreSQL`-backed [`BookingStore`].

use chrono::{DateTime, Utc};
use crewbook_core::{
    Booking, BookingId, BookingStatus, BookingStore, CustomerId, StoreError, StoreFuture, WorkerId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::map_sqlx_error;
use crate::rows::{BOOKING_COLUMNS, BookingRow, collect};

/// Bookings table access.
///
/// Status writes clear `is_open` for every status other than `pending`, in
/// the same statement, so the `open_booking_is_unassigned` constraint
/// always holds.
#[derive(Debug, Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_many(&self, sql: &str, key: Uuid) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        collect(rows)
    }
}

impl BookingStore for PostgresBookingStore {
    fn insert(&self, booking: Booking) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO bookings (
                    id, customer_id, worker_id, is_open, title, description,
                    scheduled_date, duration_hours, location, notes, total_cost,
                    status, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ",
            )
            .bind(*booking.id.as_uuid())
            .bind(*booking.customer_id.as_uuid())
            .bind(booking.worker_id.map(|w| *w.as_uuid()))
            .bind(booking.is_open)
            .bind(&booking.title)
            .bind(&booking.description)
            .bind(booking.scheduled_date)
            .bind(booking.duration_hours)
            .bind(&booking.location)
            .bind(&booking.notes)
            .bind(booking.total_cost)
            .bind(booking.status.as_str())
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            tracing::debug!(booking_id = %booking.id, "Inserted booking");
            Ok(())
        })
    }

    fn find_by_id(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
            let row: Option<BookingRow> = sqlx::query_as(&sql)
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
            row.map(Booking::try_from).transpose()
        })
    }

    fn find_by_customer(&self, customer_id: CustomerId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE customer_id = $1 \
                 ORDER BY scheduled_date DESC"
            );
            self.fetch_many(&sql, *customer_id.as_uuid()).await
        })
    }

    fn find_by_worker(&self, worker_id: WorkerId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE worker_id = $1 \
                 ORDER BY scheduled_date DESC"
            );
            self.fetch_many(&sql, *worker_id.as_uuid()).await
        })
    }

    fn find_open(&self) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings \
                 WHERE is_open AND worker_id IS NULL AND status = 'pending' \
                 ORDER BY created_at DESC"
            );
            let rows: Vec<BookingRow> = sqlx::query_as(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
            collect(rows)
        })
    }

    fn transition_status(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE bookings
                SET status = $3,
                    is_open = is_open AND $3 = 'pending',
                    updated_at = $4
                WHERE id = $1 AND status = $2
                ",
            )
            .bind(*id.as_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            Ok(result.rows_affected() == 1)
        })
    }

    fn overwrite_status(
        &self,
        id: BookingId,
        to: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE bookings
                SET status = $2,
                    is_open = is_open AND $2 = 'pending',
                    updated_at = $3
                WHERE id = $1
                ",
            )
            .bind(*id.as_uuid())
            .bind(to.as_str())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            Ok(result.rows_affected() == 1)
        })
    }

    fn claim_open(
        &self,
        id: BookingId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE bookings
                SET worker_id = $2,
                    is_open = FALSE,
                    updated_at = $3
                WHERE id = $1
                  AND is_open
                  AND worker_id IS NULL
                  AND status = 'pending'
                ",
            )
            .bind(*id.as_uuid())
            .bind(*worker_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            Ok(result.rows_affected() == 1)
        })
    }

    fn release_claim(
        &self,
        id: BookingId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE bookings
                SET worker_id = NULL,
                    is_open = TRUE,
                    updated_at = $3
                WHERE id = $1
                  AND worker_id = $2
                  AND status = 'pending'
                ",
            )
            .bind(*id.as_uuid())
            .bind(*worker_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            Ok(result.rows_affected() == 1)
        })
    }
}
