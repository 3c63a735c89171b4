//! Persistence layer for pages and their version history.
//!
//! - [`models`] -- `FromRow` entities and input DTOs.
//! - [`repositories`] -- zero-sized `*Repo` structs issuing SQL against `&PgPool`.
//! - [`store`] -- the [`PageStore`] / [`VersionStore`] seam used by the API,
//!   with [`PgStore`] as the production implementation.
//! - [`memory`] -- [`MemoryStore`], an in-process implementation for tests.

use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use memory::MemoryStore;
pub use store::{PageStore, PgStore, StoreError, VersionStore};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply any pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
