//! # Edge Rate Repository
//!
//! Beveled-edge rates (per inch, by thickness) and clipped-corner rates
//! (per corner, by thickness and size tier).

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::{
    decimal_column, decimal_from_column, require_actor, thickness_column, thickness_from_column, Audited,
};
use glazier_core::config::{BeveledRate, ClipRate, SizeTier};
use glazier_core::types::Thickness;

#[derive(Debug, sqlx::FromRow)]
struct BeveledRow {
    thickness_sixteenths: i64,
    rate_per_inch: String,
    updated_by: String,
    updated_at: DateTime<Utc>,
}

impl BeveledRow {
    fn into_audited(self) -> DbResult<Audited<BeveledRate>> {
        Ok(Audited {
            record: BeveledRate {
                thickness: thickness_from_column("beveled_rates", self.thickness_sixteenths)?,
                rate_per_inch: decimal_from_column("beveled_rates", "rate_per_inch", &self.rate_per_inch)?,
            },
            updated_by: self.updated_by,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClipRow {
    thickness_sixteenths: i64,
    size_tier: SizeTier,
    rate_per_corner: String,
    updated_by: String,
    updated_at: DateTime<Utc>,
}

impl ClipRow {
    fn into_audited(self) -> DbResult<Audited<ClipRate>> {
        Ok(Audited {
            record: ClipRate {
                thickness: thickness_from_column("clip_rates", self.thickness_sixteenths)?,
                tier: self.size_tier,
                rate_per_corner: decimal_from_column("clip_rates", "rate_per_corner", &self.rate_per_corner)?,
            },
            updated_by: self.updated_by,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for beveled and clipped-corner rates.
#[derive(Debug, Clone)]
pub struct EdgeRateRepository {
    pool: SqlitePool,
}

impl EdgeRateRepository {
    /// Creates a new EdgeRateRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EdgeRateRepository { pool }
    }

    // =========================================================================
    // Beveled
    // =========================================================================

    pub async fn list_beveled(&self) -> DbResult<Vec<Audited<BeveledRate>>> {
        let mut conn = self.pool.acquire().await?;
        fetch_beveled(&mut conn).await
    }

    /// Inserts or replaces the beveled rate for a thickness.
    pub async fn upsert_beveled(&self, rate: &BeveledRate, actor: &str) -> DbResult<Audited<BeveledRate>> {
        let actor = require_actor(actor)?;
        rate.validate()?;
        let now = Utc::now();

        debug!(thickness = %rate.thickness, actor = %actor, "Upserting beveled rate");

        sqlx::query(
            r#"
            INSERT INTO beveled_rates (thickness_sixteenths, rate_per_inch, updated_by, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (thickness_sixteenths) DO UPDATE SET
                rate_per_inch = excluded.rate_per_inch,
                updated_by = excluded.updated_by,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(thickness_column(rate.thickness))
        .bind(decimal_column(rate.rate_per_inch))
        .bind(actor)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Audited {
            record: *rate,
            updated_by: actor.to_string(),
            updated_at: now,
        })
    }

    pub async fn delete_beveled(&self, thickness: Thickness, actor: &str) -> DbResult<bool> {
        let actor = require_actor(actor)?;

        let result = sqlx::query("DELETE FROM beveled_rates WHERE thickness_sixteenths = ?1")
            .bind(thickness_column(thickness))
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(thickness = %thickness, actor = %actor, "Beveled rate deleted");
        }
        Ok(deleted)
    }

    // =========================================================================
    // Clipped corners
    // =========================================================================

    pub async fn list_clips(&self) -> DbResult<Vec<Audited<ClipRate>>> {
        let mut conn = self.pool.acquire().await?;
        fetch_clips(&mut conn).await
    }

    /// Inserts or replaces the clip rate for a (thickness, tier).
    pub async fn upsert_clip(&self, rate: &ClipRate, actor: &str) -> DbResult<Audited<ClipRate>> {
        let actor = require_actor(actor)?;
        rate.validate()?;
        let now = Utc::now();

        debug!(thickness = %rate.thickness, tier = %rate.tier, actor = %actor, "Upserting clip rate");

        sqlx::query(
            r#"
            INSERT INTO clip_rates (thickness_sixteenths, size_tier, rate_per_corner, updated_by, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (thickness_sixteenths, size_tier) DO UPDATE SET
                rate_per_corner = excluded.rate_per_corner,
                updated_by = excluded.updated_by,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(thickness_column(rate.thickness))
        .bind(rate.tier)
        .bind(decimal_column(rate.rate_per_corner))
        .bind(actor)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Audited {
            record: *rate,
            updated_by: actor.to_string(),
            updated_at: now,
        })
    }

    pub async fn delete_clip(&self, thickness: Thickness, tier: SizeTier, actor: &str) -> DbResult<bool> {
        let actor = require_actor(actor)?;

        let result = sqlx::query("DELETE FROM clip_rates WHERE thickness_sixteenths = ?1 AND size_tier = ?2")
            .bind(thickness_column(thickness))
            .bind(tier)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(thickness = %thickness, tier = %tier, actor = %actor, "Clip rate deleted");
        }
        Ok(deleted)
    }
}

pub(crate) async fn fetch_beveled(conn: &mut SqliteConnection) -> DbResult<Vec<Audited<BeveledRate>>> {
    let rows: Vec<BeveledRow> = sqlx::query_as(
        "SELECT thickness_sixteenths, rate_per_inch, updated_by, updated_at FROM beveled_rates ORDER BY thickness_sixteenths",
    )
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(BeveledRow::into_audited).collect()
}

pub(crate) async fn fetch_clips(conn: &mut SqliteConnection) -> DbResult<Vec<Audited<ClipRate>>> {
    let rows: Vec<ClipRow> = sqlx::query_as(
        r#"
        SELECT thickness_sixteenths, size_tier, rate_per_corner, updated_by, updated_at
        FROM clip_rates
        ORDER BY thickness_sixteenths, size_tier
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(ClipRow::into_audited).collect()
}
