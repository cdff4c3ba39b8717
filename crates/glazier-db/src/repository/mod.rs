//! # Repository Module
//!
//! Configuration Store repositories.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Store Layout                           │
//! │                                                                         │
//! │  Admin surface                         Quote path                      │
//! │       │                                     │                           │
//! │       │  db.formulas().save_and_activate()  │  db.quotes().quote()      │
//! │       ▼                                     ▼                           │
//! │  PricingRepository   ── pricing_entries ──┐                            │
//! │  EdgeRateRepository  ── beveled_rates   ──┤                            │
//! │                      ── clip_rates      ──┼──► snapshot::load_snapshot │
//! │  ConstantsRepository ── system_constants ─┤    (one read transaction)  │
//! │  FormulaRepository   ── formula_versions ─┘                            │
//! │                                                                         │
//! │  Every write names an actor and stamps the time.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository exposes `pub(crate)` fetch functions that take a
//! connection, so the snapshot loader can run them inside its own
//! transaction.
//!
//! ## Available Repositories
//!
//! - [`PricingRepository`](pricing::PricingRepository) - (thickness, material) price rows
//! - [`EdgeRateRepository`](edge_rate::EdgeRateRepository) - beveled and clipped-corner rates
//! - [`ConstantsRepository`](constants::ConstantsRepository) - shop-wide constants
//! - [`FormulaRepository`](formula::FormulaRepository) - versioned formulas

pub mod constants;
pub mod edge_rate;
pub mod formula;
pub mod pricing;

use chrono::{DateTime, Utc};
use glazier_core::types::Thickness;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use crate::error::{DbError, DbResult};

/// A stored configuration record with its audit stamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Audited<T> {
    pub record: T,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Trims the actor id and rejects an empty one.
pub(crate) fn require_actor(actor: &str) -> DbResult<&str> {
    let actor = actor.trim();
    if actor.is_empty() {
        return Err(DbError::MissingActor);
    }
    Ok(actor)
}

/// Column value for a thickness.
pub(crate) fn thickness_column(thickness: Thickness) -> i64 {
    i64::from(thickness.sixteenths())
}

/// Reads a stored thickness back, rejecting values no label can express.
pub(crate) fn thickness_from_column(table: &'static str, sixteenths: i64) -> DbResult<Thickness> {
    match u16::try_from(sixteenths) {
        Ok(value) if value > 0 => Ok(Thickness::from_sixteenths(value)),
        _ => Err(DbError::CorruptRow {
            table,
            reason: format!("thickness_sixteenths out of range: {sixteenths}"),
        }),
    }
}

/// Column value for an amount: its exact decimal text.
pub(crate) fn decimal_column(value: Decimal) -> String {
    value.to_string()
}

/// Reads a stored amount back from its decimal text.
pub(crate) fn decimal_from_column(table: &'static str, column: &str, text: &str) -> DbResult<Decimal> {
    Decimal::from_str(text).map_err(|err| DbError::CorruptRow {
        table,
        reason: format!("{column} is not a decimal ({text:?}): {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_actor() {
        assert_eq!(require_actor("  admin@shop ").unwrap(), "admin@shop");
        assert!(matches!(require_actor("   "), Err(DbError::MissingActor)));
    }

    #[test]
    fn test_thickness_column_round_trip() {
        let quarter = Thickness::from_sixteenths(4);
        assert_eq!(thickness_from_column("t", thickness_column(quarter)).unwrap(), quarter);
        assert!(thickness_from_column("t", 0).is_err());
        assert!(thickness_from_column("t", 70_000).is_err());
    }

    #[test]
    fn test_decimal_column_is_exact() {
        let price = Decimal::new(1250, 2);
        assert_eq!(decimal_column(price), "12.50");
        assert_eq!(decimal_from_column("t", "base_price", "12.50").unwrap(), price);
        assert_eq!(
            decimal_from_column("t", "value", "0.1").unwrap() + decimal_from_column("t", "value", "0.2").unwrap(),
            Decimal::new(3, 1)
        );
        assert!(matches!(
            decimal_from_column("t", "base_price", "twelve"),
            Err(DbError::CorruptRow { table: "t", .. })
        ));
    }
}
