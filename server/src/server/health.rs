//! Readiness probe backed by the `PostgreSQL` pool.

use crewbook_web::handlers::{HealthCheck, ReadinessProbe};
use sqlx::PgPool;
use std::future::Future;
use std::pin::Pin;

/// Reports ready while `SELECT 1` succeeds.
#[derive(Clone)]
pub struct DatabaseProbe {
    pool: PgPool,
}

impl DatabaseProbe {
    /// Probe `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ReadinessProbe for DatabaseProbe {
    fn check(&self) -> Pin<Box<dyn Future<Output = HealthCheck> + Send + '_>> {
        Box::pin(async move {
            match crewbook_postgres::ping(&self.pool).await {
                Ok(()) => HealthCheck::healthy("database"),
                Err(e) => HealthCheck::unhealthy("database", e.to_string()),
            }
        })
    }
}
