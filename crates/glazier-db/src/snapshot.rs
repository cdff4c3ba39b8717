//! # Snapshot Loader
//!
//! Reads the whole price book for one calculation.
//!
//! ```text
//! BEGIN (read)
//!   pricing_entries ─┐
//!   beveled_rates   ─┤
//!   clip_rates      ─┼──► ConfigSnapshot::new(...)
//!   system_constants─┤
//!   formula (active)─┘
//! COMMIT
//! ```
//!
//! All five reads share one transaction, so an admin write landing mid-load
//! is seen entirely or not at all.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::repository::{constants, edge_rate, formula, pricing};
use glazier_core::config::ConfigSnapshot;
use glazier_core::error::ConfigurationError;

/// What callers see when the store fails. The driver error is logged, never
/// returned.
pub const STORE_UNAVAILABLE_DETAIL: &str = "the price book could not be read";

/// Loads a fresh, validated snapshot.
///
/// ## Errors
/// - `NoActiveFormula` / `MissingSystemConstants` when the store is not set up
/// - duplicate or invalid rows, as reported by [`ConfigSnapshot::new`]
/// - `StoreUnavailable` for any database failure
pub async fn load_snapshot(pool: &SqlitePool) -> Result<ConfigSnapshot, ConfigurationError> {
    match read_snapshot(pool).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(error = %err, "Configuration store unavailable");
            Err(ConfigurationError::StoreUnavailable(STORE_UNAVAILABLE_DETAIL.to_string()))
        }
    }
}

/// Outer `Result` is the database; inner is the configuration content.
async fn read_snapshot(pool: &SqlitePool) -> DbResult<Result<ConfigSnapshot, ConfigurationError>> {
    let mut tx = pool.begin().await?;

    let pricing = pricing::fetch_all(&mut tx).await?;
    let beveled = edge_rate::fetch_beveled(&mut tx).await?;
    let clips = edge_rate::fetch_clips(&mut tx).await?;
    let constants = constants::fetch(&mut tx).await?;
    let active = formula::fetch_active(&mut tx).await?;

    tx.commit().await?;

    let Some(constants) = constants else {
        return Ok(Err(ConfigurationError::MissingSystemConstants));
    };
    let Some(active) = active else {
        return Ok(Err(ConfigurationError::NoActiveFormula));
    };

    debug!(
        pricing_entries = pricing.len(),
        beveled_rates = beveled.len(),
        clip_rates = clips.len(),
        formula_version = active.version,
        "Configuration snapshot loaded"
    );

    Ok(ConfigSnapshot::new(
        pricing.into_iter().map(|row| row.record).collect(),
        beveled.into_iter().map(|row| row.record).collect(),
        clips.into_iter().map(|row| row.record).collect(),
        constants.record,
        active.pricing_formula(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use glazier_core::config::{PricingEntry, SystemConstants};
    use glazier_core::formula::{FormulaDraft, PriceConversion};
    use glazier_core::types::{Material, Thickness};
    use rust_decimal_macros::dec;

    const QUARTER: Thickness = Thickness::from_sixteenths(4);

    fn constants() -> SystemConstants {
        SystemConstants {
            minimum_billable_area: dec!(3.0),
            contractor_discount_rate: dec!(0.10),
            flat_polish_rate: dec!(0.27),
            tempered_markup_rate: dec!(0.35),
            shape_markup_rate: dec!(0.25),
        }
    }

    #[tokio::test]
    async fn test_empty_store_reports_missing_setup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(
            load_snapshot(db.pool()).await.unwrap_err(),
            ConfigurationError::MissingSystemConstants
        );

        db.constants().set(&constants(), "owner").await.unwrap();
        assert_eq!(
            load_snapshot(db.pool()).await.unwrap_err(),
            ConfigurationError::NoActiveFormula
        );
    }

    #[tokio::test]
    async fn test_snapshot_reflects_latest_edits() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.constants().set(&constants(), "owner").await.unwrap();
        db.pricing()
            .upsert(&PricingEntry::new(QUARTER, Material::Clear, dec!(12.50), dec!(0.85)), "owner")
            .await
            .unwrap();
        db.formulas()
            .save_and_activate(&FormulaDraft::new(PriceConversion::Divisor { value: dec!(0.28) }), "owner")
            .await
            .unwrap();

        let first = load_snapshot(db.pool()).await.unwrap();
        assert_eq!(first.pricing_entry(QUARTER, Material::Clear).unwrap().base_price, dec!(12.50));
        assert_eq!(first.formula().version, 1);

        db.pricing()
            .upsert(&PricingEntry::new(QUARTER, Material::Clear, dec!(14.00), dec!(0.85)), "owner")
            .await
            .unwrap();
        db.formulas()
            .save_and_activate(&FormulaDraft::new(PriceConversion::Multiplier { value: dec!(3.5) }), "owner")
            .await
            .unwrap();

        let second = load_snapshot(db.pool()).await.unwrap();
        assert_eq!(second.pricing_entry(QUARTER, Material::Clear).unwrap().base_price, dec!(14.00));
        assert_eq!(second.formula().version, 2);
    }

    #[tokio::test]
    async fn test_closed_pool_is_store_unavailable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        let err = load_snapshot(db.pool()).await.unwrap_err();
        assert_eq!(err, ConfigurationError::StoreUnavailable(STORE_UNAVAILABLE_DETAIL.to_string()));
    }

    #[tokio::test]
    async fn test_corrupt_row_detail_stays_in_the_log() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.constants().set(&constants(), "owner").await.unwrap();
        db.formulas()
            .save_and_activate(&FormulaDraft::new(PriceConversion::Divisor { value: dec!(0.28) }), "owner")
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO pricing_entries (thickness_sixteenths, material, base_price, polish_price, \
             updated_by, updated_at) VALUES (4, 'clear', '1.2.3', '0.85', 'a', '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = load_snapshot(db.pool()).await.unwrap_err();
        let shown = err.to_string();
        assert_eq!(shown, format!("configuration store unavailable: {STORE_UNAVAILABLE_DETAIL}"));
        assert!(!shown.contains("pricing_entries"));
        assert!(!shown.contains("1.2.3"));
    }
}
