//! # Database Migrations
//!
//! Embedded SQL migrations for the inventory store.
//!
//! ```text
//! Database::new
//!      │
//!      ▼
//! _sqlx_migrations present?  ── no ──► create it
//!      │
//!      ▼
//! embedded vs applied
//!      ├── 0001_initial_schema.sql  ✓ applied
//!      └── 0002_...                 ⬜ run now, record checksum
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Add `NNNN_description.sql` under `migrations/sqlite/`
//! 2. Never edit an applied migration; add a new one

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations embedded from `migrations/sqlite` at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending migrations in filename order. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // Table is absent until the first run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
