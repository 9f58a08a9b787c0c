//! `PostgreSQL`-backed [`IdentityResolver`] over the `users`, `customers`
//! and `workers` tables.

use crewbook_core::{
    CustomerId, CustomerProfile, IdentityResolver, StoreFuture, UserId, WorkerId, WorkerProfile,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::map_sqlx_error;

/// Read access to identity records, plus lazy worker creation.
#[derive(Debug, Clone)]
pub struct PostgresIdentityResolver {
    pool: PgPool,
}

impl PostgresIdentityResolver {
    /// Create a resolver over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerProfileRow {
    id: Uuid,
    user_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
}

#[derive(sqlx::FromRow)]
struct WorkerProfileRow {
    id: Uuid,
    user_id: Uuid,
    first_name: String,
    last_name: String,
    specialty: String,
    availability_status: String,
}

impl IdentityResolver for PostgresIdentityResolver {
    fn customer_for_user(&self, user_id: UserId) -> StoreFuture<'_, Option<CustomerId>> {
        Box::pin(async move {
            let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM customers WHERE user_id = $1")
                .bind(*user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
            Ok(row.map(|(id,)| CustomerId::from_uuid(id)))
        })
    }

    fn worker_for_user(&self, user_id: UserId) -> StoreFuture<'_, Option<WorkerId>> {
        Box::pin(async move {
            let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM workers WHERE user_id = $1")
                .bind(*user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
            Ok(row.map(|(id,)| WorkerId::from_uuid(id)))
        })
    }

    fn ensure_worker_for_user(&self, user_id: UserId) -> StoreFuture<'_, Option<WorkerId>> {
        Box::pin(async move {
            // Concurrent first requests race here; the unique user_id makes
            // the loser a no-op and both read back the same row.
            let inserted = sqlx::query(
                r"
                INSERT INTO workers (id, user_id, availability_status)
                SELECT $1, $2, 'available'
                WHERE EXISTS (SELECT 1 FROM users WHERE id = $2)
                ON CONFLICT (user_id) DO NOTHING
                ",
            )
            .bind(Uuid::new_v4())
            .bind(*user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            if inserted.rows_affected() == 1 {
                tracing::info!(user_id = %user_id, "Created worker record");
            }

            self.worker_for_user(user_id).await
        })
    }

    fn customer_profile(&self, id: CustomerId) -> StoreFuture<'_, Option<CustomerProfile>> {
        Box::pin(async move {
            let row: Option<CustomerProfileRow> = sqlx::query_as(
                r"
                SELECT c.id, c.user_id, u.first_name, u.last_name, u.email
                FROM customers c
                JOIN users u ON u.id = c.user_id
                WHERE c.id = $1
                ",
            )
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            Ok(row.map(|r| CustomerProfile {
                id: CustomerId::from_uuid(r.id),
                user_id: UserId::from_uuid(r.user_id),
                first_name: r.first_name,
                last_name: r.last_name,
                email: r.email,
            }))
        })
    }

    fn worker_profile(&self, id: WorkerId) -> StoreFuture<'_, Option<WorkerProfile>> {
        Box::pin(async move {
            let row: Option<WorkerProfileRow> = sqlx::query_as(
                r"
                SELECT w.id, w.user_id, u.first_name, u.last_name, w.specialty, w.availability_status
                FROM workers w
                JOIN users u ON u.id = w.user_id
                WHERE w.id = $1
                ",
            )
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            Ok(row.map(|r| WorkerProfile {
                id: WorkerId::from_uuid(r.id),
                user_id: UserId::from_uuid(r.user_id),
                first_name: r.first_name,
                last_name: r.last_name,
                specialty: r.specialty,
                availability_status: r.availability_status,
            }))
        })
    }
}
