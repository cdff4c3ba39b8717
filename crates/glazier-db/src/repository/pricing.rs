//! # Pricing Repository
//!
//! Price book rows keyed by (thickness, material).
//!
//! ## Key Operations
//! - List / get for the admin surface
//! - Upsert with validation (a bad row never reaches a quote)
//! - Delete

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::{
    decimal_column, decimal_from_column, require_actor, thickness_column, thickness_from_column, Audited,
};
use glazier_core::config::PricingEntry;
use glazier_core::types::{Material, Thickness};

const TABLE: &str = "pricing_entries";

#[derive(Debug, sqlx::FromRow)]
struct PricingRow {
    thickness_sixteenths: i64,
    material: Material,
    base_price: String,
    polish_price: String,
    flat_polish: bool,
    never_tempered: bool,
    only_tempered: bool,
    updated_by: String,
    updated_at: DateTime<Utc>,
}

impl PricingRow {
    fn into_audited(self) -> DbResult<Audited<PricingEntry>> {
        let thickness = thickness_from_column(TABLE, self.thickness_sixteenths)?;
        let base_price = decimal_from_column(TABLE, "base_price", &self.base_price)?;
        let polish_price = decimal_from_column(TABLE, "polish_price", &self.polish_price)?;
        let record = PricingEntry::new(thickness, self.material, base_price, polish_price)
            .flat_polish(self.flat_polish)
            .never_tempered(self.never_tempered)
            .only_tempered(self.only_tempered);

        Ok(Audited {
            record,
            updated_by: self.updated_by,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for the price book.
///
/// ## Usage
/// ```rust,ignore
/// let repo = PricingRepository::new(pool);
///
/// let entry = PricingEntry::new(quarter, Material::Clear, dec!(12.50), dec!(0.85));
/// repo.upsert(&entry, "admin@shop").await?;
///
/// let entries = repo.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct PricingRepository {
    pool: SqlitePool,
}

impl PricingRepository {
    /// Creates a new PricingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PricingRepository { pool }
    }

    /// Lists every entry, thinnest first.
    pub async fn list(&self) -> DbResult<Vec<Audited<PricingEntry>>> {
        let mut conn = self.pool.acquire().await?;
        fetch_all(&mut conn).await
    }

    /// Gets one entry.
    pub async fn get(&self, thickness: Thickness, material: Material) -> DbResult<Option<Audited<PricingEntry>>> {
        let row: Option<PricingRow> = sqlx::query_as(
            r#"
            SELECT thickness_sixteenths, material, base_price, polish_price,
                   flat_polish, never_tempered, only_tempered,
                   updated_by, updated_at
            FROM pricing_entries
            WHERE thickness_sixteenths = ?1 AND material = ?2
            "#,
        )
        .bind(thickness_column(thickness))
        .bind(material)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PricingRow::into_audited).transpose()
    }

    /// Inserts or replaces the entry for its (thickness, material).
    ///
    /// ## Errors
    /// - `MissingActor` for an empty actor
    /// - `InvalidConfig` for negative prices or conflicting temper flags
    pub async fn upsert(&self, entry: &PricingEntry, actor: &str) -> DbResult<Audited<PricingEntry>> {
        let actor = require_actor(actor)?;
        entry.validate()?;
        let now = Utc::now();

        debug!(
            thickness = %entry.thickness,
            material = %entry.material,
            actor = %actor,
            "Upserting pricing entry"
        );

        sqlx::query(
            r#"
            INSERT INTO pricing_entries (
                thickness_sixteenths, material, base_price, polish_price,
                flat_polish, never_tempered, only_tempered,
                updated_by, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (thickness_sixteenths, material) DO UPDATE SET
                base_price = excluded.base_price,
                polish_price = excluded.polish_price,
                flat_polish = excluded.flat_polish,
                never_tempered = excluded.never_tempered,
                only_tempered = excluded.only_tempered,
                updated_by = excluded.updated_by,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(thickness_column(entry.thickness))
        .bind(entry.material)
        .bind(decimal_column(entry.base_price))
        .bind(decimal_column(entry.polish_price))
        .bind(entry.flat_polish)
        .bind(entry.never_tempered)
        .bind(entry.only_tempered)
        .bind(actor)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Audited {
            record: entry.clone(),
            updated_by: actor.to_string(),
            updated_at: now,
        })
    }

    /// Deletes an entry. Returns false if there was none.
    pub async fn delete(&self, thickness: Thickness, material: Material, actor: &str) -> DbResult<bool> {
        let actor = require_actor(actor)?;

        let result = sqlx::query("DELETE FROM pricing_entries WHERE thickness_sixteenths = ?1 AND material = ?2")
            .bind(thickness_column(thickness))
            .bind(material)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(thickness = %thickness, material = %material, actor = %actor, "Pricing entry deleted");
        }
        Ok(deleted)
    }
}

/// Reads every entry on the given connection.
pub(crate) async fn fetch_all(conn: &mut SqliteConnection) -> DbResult<Vec<Audited<PricingEntry>>> {
    let rows: Vec<PricingRow> = sqlx::query_as(
        r#"
        SELECT thickness_sixteenths, material, base_price, polish_price,
               flat_polish, never_tempered, only_tempered,
               updated_by, updated_at
        FROM pricing_entries
        ORDER BY thickness_sixteenths, material
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(PricingRow::into_audited).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use rust_decimal_macros::dec;

    const QUARTER: Thickness = Thickness::from_sixteenths(4);

    async fn repo() -> PricingRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.pricing()
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let repo = repo().await;
        let entry = PricingEntry::new(QUARTER, Material::Clear, dec!(12.50), dec!(0.85));

        repo.upsert(&entry, "admin@shop").await.unwrap();
        let stored = repo.get(QUARTER, Material::Clear).await.unwrap().unwrap();

        assert_eq!(stored.record, entry);
        assert_eq!(stored.updated_by, "admin@shop");
    }

    #[tokio::test]
    async fn test_prices_stored_as_exact_text() {
        let repo = repo().await;
        let entry = PricingEntry::new(QUARTER, Material::Clear, dec!(12.345), dec!(0.1));
        repo.upsert(&entry, "admin@shop").await.unwrap();

        let (base, polish): (String, String) =
            sqlx::query_as("SELECT base_price, polish_price FROM pricing_entries")
                .fetch_one(&repo.pool)
                .await
                .unwrap();
        assert_eq!(base, "12.345");
        assert_eq!(polish, "0.1");

        let stored = repo.get(QUARTER, Material::Clear).await.unwrap().unwrap();
        assert_eq!(stored.record.polish_price, dec!(0.1));
    }

    #[tokio::test]
    async fn test_corrupt_price_text_is_reported() {
        let repo = repo().await;
        sqlx::query(
            "INSERT INTO pricing_entries (thickness_sixteenths, material, base_price, polish_price, \
             updated_by, updated_at) VALUES (4, 'clear', '1.2.3', '0.85', 'a', '2026-01-01T00:00:00Z')",
        )
        .execute(&repo.pool)
        .await
        .unwrap();

        assert!(matches!(
            repo.list().await,
            Err(DbError::CorruptRow { table: "pricing_entries", .. })
        ));
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let repo = repo().await;
        repo.upsert(&PricingEntry::new(QUARTER, Material::Clear, dec!(12.50), dec!(0.85)), "a")
            .await
            .unwrap();
        repo.upsert(&PricingEntry::new(QUARTER, Material::Clear, dec!(13.25), dec!(0.90)), "b")
            .await
            .unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].record.base_price, dec!(13.25));
        assert_eq!(all[0].updated_by, "b");
    }

    #[tokio::test]
    async fn test_rejects_invalid_entries() {
        let repo = repo().await;

        let negative = PricingEntry::new(QUARTER, Material::Clear, dec!(-1), dec!(0.85));
        assert!(matches!(repo.upsert(&negative, "a").await, Err(DbError::InvalidConfig(_))));

        let conflicting = PricingEntry::new(QUARTER, Material::Tinted, dec!(14), dec!(0.85))
            .never_tempered(true)
            .only_tempered(true);
        assert!(matches!(repo.upsert(&conflicting, "a").await, Err(DbError::InvalidConfig(_))));

        let valid = PricingEntry::new(QUARTER, Material::Clear, dec!(12.5), dec!(0.85));
        assert!(matches!(repo.upsert(&valid, " ").await, Err(DbError::MissingActor)));

        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        repo.upsert(&PricingEntry::new(QUARTER, Material::Mirror, dec!(15), dec!(0.85)), "a")
            .await
            .unwrap();

        assert!(repo.delete(QUARTER, Material::Mirror, "a").await.unwrap());
        assert!(!repo.delete(QUARTER, Material::Mirror, "a").await.unwrap());
        assert!(repo.get(QUARTER, Material::Mirror).await.unwrap().is_none());
    }
}
