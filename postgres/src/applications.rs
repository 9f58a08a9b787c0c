//! `PostgreSQL`-backed [`ApplicationStore`].

use chrono::{DateTime, Utc};
use crewbook_core::{
    ApplicationId, ApplicationStatus, ApplicationStore, BookingApplication, BookingId,
    StoreError, StoreFuture, WorkerId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::map_sqlx_error;
use crate::rows::{APPLICATION_COLUMNS, ApplicationRow, collect};

/// Applications table access. Uniqueness per `(booking, worker)` is the
/// `one_application_per_worker` constraint.
#[derive(Debug, Clone)]
pub struct PostgresApplicationStore {
    pool: PgPool,
}

impl PostgresApplicationStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_many(
        &self,
        key_column: &str,
        key: Uuid,
    ) -> Result<Vec<BookingApplication>, StoreError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM booking_applications \
             WHERE {key_column} = $1 ORDER BY created_at DESC"
        );
        let rows: Vec<ApplicationRow> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        collect(rows)
    }
}

impl ApplicationStore for PostgresApplicationStore {
    fn insert(&self, application: BookingApplication) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO booking_applications (
                    id, booking_id, worker_id, message, proposed_price,
                    status, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(*application.id.as_uuid())
            .bind(*application.booking_id.as_uuid())
            .bind(*application.worker_id.as_uuid())
            .bind(&application.message)
            .bind(application.proposed_price)
            .bind(application.status.as_str())
            .bind(application.created_at)
            .bind(application.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
            Ok(())
        })
    }

    fn find_by_id(&self, id: ApplicationId) -> StoreFuture<'_, Option<BookingApplication>> {
        Box::pin(async move {
            let sql = format!("SELECT {APPLICATION_COLUMNS} FROM booking_applications WHERE id = $1");
            let row: Option<ApplicationRow> = sqlx::query_as(&sql)
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
            row.map(BookingApplication::try_from).transpose()
        })
    }

    fn find_by_booking(&self, booking_id: BookingId) -> StoreFuture<'_, Vec<BookingApplication>> {
        Box::pin(async move { self.fetch_many("booking_id", *booking_id.as_uuid()).await })
    }

    fn find_by_worker(&self, worker_id: WorkerId) -> StoreFuture<'_, Vec<BookingApplication>> {
        Box::pin(async move { self.fetch_many("worker_id", *worker_id.as_uuid()).await })
    }

    fn exists_for(&self, booking_id: BookingId, worker_id: WorkerId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let (exists,): (bool,) = sqlx::query_as(
                r"
                SELECT EXISTS (
                    SELECT 1 FROM booking_applications
                    WHERE booking_id = $1 AND worker_id = $2
                )
                ",
            )
            .bind(*booking_id.as_uuid())
            .bind(*worker_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
            Ok(exists)
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
            let result = sqlx::query(
                r"
                UPDATE booking_applications
                SET status = $3, updated_at = $4
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
}
