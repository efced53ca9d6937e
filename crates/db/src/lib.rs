//! Database layer: models and repositories over PostgreSQL via sqlx.

pub mod models;
pub mod repositories;

use sqlx::PgPool;

/// Verify database connectivity with a trivial query.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
