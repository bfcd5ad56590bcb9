//! Postgres persistence for facilities, equipment, cleaning logs, and alerts.
//!
//! Repositories are zero-sized structs whose async methods take a pool (or a
//! transaction connection) as the first argument and return `sqlx::Error`.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod models;
pub mod repositories;

pub type DbPool = PgPool;

/// Maximum pooled connections per process.
const MAX_CONNECTIONS: u32 = 10;

/// How long to wait for a free connection before failing a query.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect to Postgres and build the shared pool.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
