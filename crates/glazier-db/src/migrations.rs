//! # Database Migrations
//!
//! Embedded SQL migrations for the Configuration Store.
//!
//! ```text
//! startup ──► _sqlx_migrations ──► pending files, in order ──► ready
//!
//! 001_pricing_schema.sql
//!   pricing_entries, beveled_rates, clip_rates, system_constants
//!   formula_versions + single-active index
//!   history triggers (archived rows immutable, content frozen after
//!   activation, only drafts deletable)
//! ```
//!
//! Never edit an applied migration. Add `NNN_description.sql` instead.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

/// Migrations embedded from `migrations/sqlite` at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs pending migrations. Safe to call on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("Configuration store schema is current");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts.
///
/// A fresh database without `_sqlx_migrations` reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
