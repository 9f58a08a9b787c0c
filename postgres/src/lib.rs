//! `PostgreSQL` persistence for Crewbook.
//!
//! Implements [`BookingStore`](crewbook_core::BookingStore),
//! [`ApplicationStore`](crewbook_core::ApplicationStore) and
//! [`IdentityResolver`](crewbook_core::IdentityResolver) on top of a shared
//! [`PgPool`]. Guarded writes are single `UPDATE ... WHERE <predicate>`
//! statements and the winner is decided by `rows_affected()`, so the
//! guarantees hold across any number of server processes.
//!
//! # Example
//!
//! ```no_run
//! use crewbook_postgres::{PostgresBookingStore, migrate};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/crewbook").await?;
//! migrate(&pool).await?;
//! let bookings = PostgresBookingStore::new(pool);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod applications;
mod bookings;
mod identity;
mod rows;

pub use applications::PostgresApplicationStore;
pub use bookings::PostgresBookingStore;
pub use identity::PostgresIdentityResolver;

use crewbook_core::StoreError;
use sqlx::PgPool;

/// Apply the embedded schema migrations.
///
/// # Errors
///
/// Returns [`StoreError::DatabaseError`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::DatabaseError(format!("migration failed: {e}")))?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Round-trip a trivial query to check the database is reachable.
///
/// # Errors
///
/// Returns [`StoreError::DatabaseError`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

/// Map a driver error, keeping unique violations distinguishable.
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return StoreError::UniqueViolation(db.message().to_string());
        }
    }
    StoreError::DatabaseError(e.to_string())
}
