//! Persistence for Hearth categories.
//!
//! Connection bootstrap lives here; the category contract is
//! [`repositories::CategoryStore`], backed by one of the adapters in
//! [`backend`].

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod backend;
pub mod config;
pub mod models;
pub mod repositories;

use config::DbConfig;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from the database configuration.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
