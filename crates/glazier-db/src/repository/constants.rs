//! # Constants Repository
//!
//! The single `system_constants` row.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::DbResult;
use crate::repository::{decimal_column, decimal_from_column, require_actor, Audited};
use glazier_core::config::SystemConstants;

const TABLE: &str = "system_constants";

#[derive(Debug, sqlx::FromRow)]
struct ConstantsRow {
    minimum_billable_area: String,
    contractor_discount_rate: String,
    flat_polish_rate: String,
    tempered_markup_rate: String,
    shape_markup_rate: String,
    updated_by: String,
    updated_at: DateTime<Utc>,
}

impl ConstantsRow {
    fn into_audited(self) -> DbResult<Audited<SystemConstants>> {
        let column = |name: &str, text: &str| decimal_from_column(TABLE, name, text);

        Ok(Audited {
            record: SystemConstants {
                minimum_billable_area: column("minimum_billable_area", &self.minimum_billable_area)?,
                contractor_discount_rate: column("contractor_discount_rate", &self.contractor_discount_rate)?,
                flat_polish_rate: column("flat_polish_rate", &self.flat_polish_rate)?,
                tempered_markup_rate: column("tempered_markup_rate", &self.tempered_markup_rate)?,
                shape_markup_rate: column("shape_markup_rate", &self.shape_markup_rate)?,
            },
            updated_by: self.updated_by,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for shop-wide constants.
#[derive(Debug, Clone)]
pub struct ConstantsRepository {
    pool: SqlitePool,
}

impl ConstantsRepository {
    /// Creates a new ConstantsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConstantsRepository { pool }
    }

    /// Returns the constants, or `None` before they are first set.
    pub async fn get(&self) -> DbResult<Option<Audited<SystemConstants>>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn).await
    }

    /// Replaces the constants.
    ///
    /// ## Errors
    /// `InvalidConfig` when a value is negative or above the price book ceiling,
    /// or the discount is outside [0, 1].
    pub async fn set(&self, constants: &SystemConstants, actor: &str) -> DbResult<Audited<SystemConstants>> {
        let actor = require_actor(actor)?;
        constants.validate()?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO system_constants (
                id, minimum_billable_area, contractor_discount_rate, flat_polish_rate,
                tempered_markup_rate, shape_markup_rate, updated_by, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO UPDATE SET
                minimum_billable_area = excluded.minimum_billable_area,
                contractor_discount_rate = excluded.contractor_discount_rate,
                flat_polish_rate = excluded.flat_polish_rate,
                tempered_markup_rate = excluded.tempered_markup_rate,
                shape_markup_rate = excluded.shape_markup_rate,
                updated_by = excluded.updated_by,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(decimal_column(constants.minimum_billable_area))
        .bind(decimal_column(constants.contractor_discount_rate))
        .bind(decimal_column(constants.flat_polish_rate))
        .bind(decimal_column(constants.tempered_markup_rate))
        .bind(decimal_column(constants.shape_markup_rate))
        .bind(actor)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(actor = %actor, "System constants updated");

        Ok(Audited {
            record: *constants,
            updated_by: actor.to_string(),
            updated_at: now,
        })
    }
}

pub(crate) async fn fetch(conn: &mut SqliteConnection) -> DbResult<Option<Audited<SystemConstants>>> {
    let row: Option<ConstantsRow> = sqlx::query_as(
        r#"
        SELECT minimum_billable_area, contractor_discount_rate, flat_polish_rate,
               tempered_markup_rate, shape_markup_rate, updated_by, updated_at
        FROM system_constants
        WHERE id = 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    row.map(ConstantsRow::into_audited).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use rust_decimal_macros::dec;

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
    async fn test_set_and_get() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().constants();
        assert!(repo.get().await.unwrap().is_none());

        repo.set(&constants(), "owner").await.unwrap();
        let mut changed = constants();
        changed.minimum_billable_area = dec!(4.0);
        repo.set(&changed, "manager").await.unwrap();

        let stored = repo.get().await.unwrap().unwrap();
        assert_eq!(stored.record, changed);
        assert_eq!(stored.updated_by, "manager");
    }

    #[tokio::test]
    async fn test_rejects_discount_over_one() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().constants();
        let mut bad = constants();
        bad.contractor_discount_rate = dec!(1.2);

        assert!(matches!(repo.set(&bad, "owner").await, Err(DbError::InvalidConfig(_))));
        assert!(repo.get().await.unwrap().is_none());
    }
}
