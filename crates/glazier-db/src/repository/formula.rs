//! # Formula Repository
//!
//! Append-only formula version log with exactly one active version.
//!
//! ## Formula Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Formula Lifecycle                                 │
//! │                                                                         │
//! │  1. SAVE                                                               │
//! │     └── create_draft()       → v7 { status: Draft }                    │
//! │     └── (validated first; an unusable formula is never written)        │
//! │                                                                         │
//! │  2. ACTIVATE (one transaction)                                         │
//! │     └── activate(v7)         → v6 Active → Archived                    │
//! │                                v7 Draft  → Active                      │
//! │     └── save_and_activate()  → same, without the separate draft step   │
//! │                                                                         │
//! │  3. ROLL BACK                                                          │
//! │     └── restore(v4)          → v8 { copy of v4, status: Active }       │
//! │     └── (v4 itself stays archived; history never shrinks)              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inside each activating transaction the current active row is archived
//! before the new row becomes active, so the partial unique index on
//! `status = 'active'` holds at every statement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{decimal_column, decimal_from_column, require_actor};
use glazier_core::formula::{
    ComponentToggles, FormulaConfiguration, FormulaDraft, FormulaMode, FormulaStatus, PriceConversion,
};

const TABLE: &str = "formula_versions";

const SELECT_FORMULA: &str = r#"
    SELECT id, version, status, mode, value, expression,
           base_enabled, polish_enabled, beveled_enabled, clipped_corners_enabled,
           tempered_markup_enabled, shape_markup_enabled, contractor_discount_enabled,
           description, created_by, created_at, activated_by, activated_at, archived_by, archived_at
    FROM formula_versions
"#;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct FormulaRow {
    id: String,
    version: i64,
    status: FormulaStatus,
    mode: FormulaMode,
    value: Option<String>,
    expression: Option<String>,
    base_enabled: bool,
    polish_enabled: bool,
    beveled_enabled: bool,
    clipped_corners_enabled: bool,
    tempered_markup_enabled: bool,
    shape_markup_enabled: bool,
    contractor_discount_enabled: bool,
    description: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    activated_by: Option<String>,
    activated_at: Option<DateTime<Utc>>,
    archived_by: Option<String>,
    archived_at: Option<DateTime<Utc>>,
}

fn corrupt(reason: String) -> DbError {
    DbError::CorruptRow { table: TABLE, reason }
}

impl TryFrom<FormulaRow> for FormulaConfiguration {
    type Error = DbError;

    fn try_from(row: FormulaRow) -> DbResult<Self> {
        let id = Uuid::parse_str(&row.id).map_err(|e| corrupt(format!("id '{}': {e}", row.id)))?;

        let value = row
            .value
            .as_deref()
            .map(|text| decimal_from_column(TABLE, "value", text))
            .transpose()?;

        let conversion = match (row.mode, value, row.expression) {
            (FormulaMode::Divisor, Some(value), None) => PriceConversion::Divisor { value },
            (FormulaMode::Multiplier, Some(value), None) => PriceConversion::Multiplier { value },
            (FormulaMode::Custom, None, Some(expression)) => PriceConversion::Custom { expression },
            (mode, ..) => {
                return Err(corrupt(format!(
                    "version {}: {mode} formula has mismatched value/expression",
                    row.version
                )))
            }
        };

        Ok(FormulaConfiguration {
            id,
            version: row.version,
            status: row.status,
            conversion,
            components: ComponentToggles {
                base: row.base_enabled,
                polish: row.polish_enabled,
                beveled: row.beveled_enabled,
                clipped_corners: row.clipped_corners_enabled,
                tempered_markup: row.tempered_markup_enabled,
                shape_markup: row.shape_markup_enabled,
                contractor_discount: row.contractor_discount_enabled,
            },
            description: row.description,
            created_by: row.created_by,
            created_at: row.created_at,
            activated_by: row.activated_by,
            activated_at: row.activated_at,
            archived_by: row.archived_by,
            archived_at: row.archived_at,
        })
    }
}

/// Splits a conversion into its (mode, value, expression) columns.
fn conversion_columns(conversion: &PriceConversion) -> (FormulaMode, Option<Decimal>, Option<&str>) {
    match conversion {
        PriceConversion::Divisor { value } => (FormulaMode::Divisor, Some(*value), None),
        PriceConversion::Multiplier { value } => (FormulaMode::Multiplier, Some(*value), None),
        PriceConversion::Custom { expression } => (FormulaMode::Custom, None, Some(expression.as_str())),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for formula versions.
///
/// ## Usage
/// ```rust,ignore
/// let repo = FormulaRepository::new(pool);
///
/// let draft = FormulaDraft::new(PriceConversion::Divisor { value: dec!(0.28) });
/// let v1 = repo.save_and_activate(&draft, "owner@shop").await?;
///
/// let history = repo.history().await?;
/// ```
#[derive(Debug, Clone)]
pub struct FormulaRepository {
    pool: SqlitePool,
}

impl FormulaRepository {
    /// Creates a new FormulaRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FormulaRepository { pool }
    }

    /// The formula every calculation currently uses.
    pub async fn active(&self) -> DbResult<Option<FormulaConfiguration>> {
        let mut conn = self.pool.acquire().await?;
        fetch_active(&mut conn).await
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Option<FormulaConfiguration>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Every version, newest first.
    pub async fn history(&self) -> DbResult<Vec<FormulaConfiguration>> {
        let sql = format!("{SELECT_FORMULA} ORDER BY version DESC");
        let rows: Vec<FormulaRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(FormulaConfiguration::try_from).collect()
    }

    /// Saves a validated formula as a draft. Nothing changes for quotes.
    ///
    /// ## Errors
    /// - `MissingActor`
    /// - `InvalidFormula`: zero divisor, bad multiplier, unsafe expression
    pub async fn create_draft(&self, draft: &FormulaDraft, actor: &str) -> DbResult<FormulaConfiguration> {
        let actor = require_actor(actor)?;
        draft.validate()?;

        let mut tx = self.pool.begin().await?;
        let version = next_version(&mut tx).await?;
        let saved = insert_version(&mut tx, version, FormulaStatus::Draft, draft, actor, Utc::now()).await?;
        tx.commit().await?;

        info!(version, mode = %saved.mode(), actor = %actor, "Formula draft saved");
        Ok(saved)
    }

    /// Promotes a draft to active and archives the previous active version,
    /// in one transaction.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `InvalidTransition` unless the version is a draft
    pub async fn activate(&self, id: Uuid, actor: &str) -> DbResult<FormulaConfiguration> {
        let actor = require_actor(actor)?;

        let mut tx = self.pool.begin().await?;

        let mut formula = fetch_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Formula", id.to_string()))?;
        if formula.status != FormulaStatus::Draft {
            return Err(DbError::InvalidTransition {
                id: id.to_string(),
                status: formula.status,
                action: "activate",
            });
        }
        formula.conversion.validate()?;

        let now = Utc::now();
        let archived = archive_active(&mut tx, actor, now).await?;

        let result = sqlx::query(
            r#"
            UPDATE formula_versions
            SET status = 'active', activated_by = ?1, activated_at = ?2
            WHERE id = ?3 AND status = 'draft'
            "#,
        )
        .bind(actor)
        .bind(now)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(DbError::TransactionFailed(format!(
                "formula {id} changed status during activation"
            )));
        }

        tx.commit().await?;

        info!(
            version = formula.version,
            archived_version = ?archived,
            actor = %actor,
            "Formula activated"
        );

        formula.status = FormulaStatus::Active;
        formula.activated_by = Some(actor.to_string());
        formula.activated_at = Some(now);
        Ok(formula)
    }

    /// Saves a formula as a new version and makes it active immediately.
    pub async fn save_and_activate(&self, draft: &FormulaDraft, actor: &str) -> DbResult<FormulaConfiguration> {
        let actor = require_actor(actor)?;
        draft.validate()?;

        let mut tx = self.pool.begin().await?;
        let (saved, archived) = insert_active(&mut tx, draft, actor).await?;
        tx.commit().await?;

        info!(
            version = saved.version,
            mode = %saved.mode(),
            archived_version = ?archived,
            actor = %actor,
            "Formula saved and activated"
        );
        Ok(saved)
    }

    /// Re-activates an archived formula by copying it into a new version.
    ///
    /// The archived row is left untouched.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `InvalidTransition` unless the version is archived
    pub async fn restore(&self, archived_id: Uuid, actor: &str) -> DbResult<FormulaConfiguration> {
        let actor = require_actor(actor)?;

        let mut tx = self.pool.begin().await?;

        let source = fetch_by_id(&mut tx, archived_id)
            .await?
            .ok_or_else(|| DbError::not_found("Formula", archived_id.to_string()))?;
        if source.status != FormulaStatus::Archived {
            return Err(DbError::InvalidTransition {
                id: archived_id.to_string(),
                status: source.status,
                action: "restore",
            });
        }

        let draft = FormulaDraft {
            conversion: source.conversion.clone(),
            components: source.components,
            description: Some(format!("Restored from version {}", source.version)),
        };
        draft.validate()?;

        let (saved, archived) = insert_active(&mut tx, &draft, actor).await?;
        tx.commit().await?;

        info!(
            version = saved.version,
            restored_from = source.version,
            archived_version = ?archived,
            actor = %actor,
            "Formula restored"
        );
        Ok(saved)
    }
}

// =============================================================================
// Connection-level Helpers
// =============================================================================

pub(crate) async fn fetch_active(conn: &mut SqliteConnection) -> DbResult<Option<FormulaConfiguration>> {
    let sql = format!("{SELECT_FORMULA} WHERE status = 'active'");
    let row: Option<FormulaRow> = sqlx::query_as(&sql).fetch_optional(&mut *conn).await?;

    row.map(FormulaConfiguration::try_from).transpose()
}

async fn fetch_by_id(conn: &mut SqliteConnection, id: Uuid) -> DbResult<Option<FormulaConfiguration>> {
    let sql = format!("{SELECT_FORMULA} WHERE id = ?1");
    let row: Option<FormulaRow> = sqlx::query_as(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(FormulaConfiguration::try_from).transpose()
}

async fn next_version(conn: &mut SqliteConnection) -> DbResult<i64> {
    let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) + 1 FROM formula_versions")
        .fetch_one(&mut *conn)
        .await?;
    Ok(version)
}

/// Archives the current active version, if any. Returns its version number.
async fn archive_active(conn: &mut SqliteConnection, actor: &str, now: DateTime<Utc>) -> DbResult<Option<i64>> {
    let archived: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE formula_versions
        SET status = 'archived', archived_by = ?1, archived_at = ?2
        WHERE status = 'active'
        RETURNING version
        "#,
    )
    .bind(actor)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(version) = archived {
        debug!(version, "Archived previous active formula");
    }
    Ok(archived)
}

/// Archives the current active version, then inserts `draft` as the new one.
async fn insert_active(
    conn: &mut SqliteConnection,
    draft: &FormulaDraft,
    actor: &str,
) -> DbResult<(FormulaConfiguration, Option<i64>)> {
    let now = Utc::now();
    let version = next_version(conn).await?;
    let archived = archive_active(conn, actor, now).await?;
    let saved = insert_version(conn, version, FormulaStatus::Active, draft, actor, now).await?;
    Ok((saved, archived))
}

async fn insert_version(
    conn: &mut SqliteConnection,
    version: i64,
    status: FormulaStatus,
    draft: &FormulaDraft,
    actor: &str,
    now: DateTime<Utc>,
) -> DbResult<FormulaConfiguration> {
    let id = Uuid::new_v4();
    let activated_by = (status == FormulaStatus::Active).then_some(actor);
    let activated_at = (status == FormulaStatus::Active).then_some(now);
    let (mode, value, expression) = conversion_columns(&draft.conversion);
    let toggles = draft.components;

    debug!(%id, version, ?status, "Inserting formula version");

    sqlx::query(
        r#"
        INSERT INTO formula_versions (
            id, version, status, mode, value, expression,
            base_enabled, polish_enabled, beveled_enabled, clipped_corners_enabled,
            tempered_markup_enabled, shape_markup_enabled, contractor_discount_enabled,
            description, created_by, created_at, activated_by, activated_at, archived_by, archived_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10,
            ?11, ?12, ?13,
            ?14, ?15, ?16, ?17, ?18, NULL, NULL
        )
        "#,
    )
    .bind(id.to_string())
    .bind(version)
    .bind(status)
    .bind(mode)
    .bind(value.map(decimal_column))
    .bind(expression)
    .bind(toggles.base)
    .bind(toggles.polish)
    .bind(toggles.beveled)
    .bind(toggles.clipped_corners)
    .bind(toggles.tempered_markup)
    .bind(toggles.shape_markup)
    .bind(toggles.contractor_discount)
    .bind(draft.description.as_deref())
    .bind(actor)
    .bind(now)
    .bind(activated_by)
    .bind(activated_at)
    .execute(&mut *conn)
    .await?;

    Ok(FormulaConfiguration {
        id,
        version,
        status,
        conversion: draft.conversion.clone(),
        components: toggles,
        description: draft.description.clone(),
        created_by: actor.to_string(),
        created_at: now,
        activated_by: activated_by.map(str::to_string),
        activated_at,
        archived_by: None,
        archived_at: None,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
