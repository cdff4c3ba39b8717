//! # Configuration Snapshot
//!
//! The price book a single calculation runs against.
//!
//! ## Snapshot Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One Snapshot Per Calculation                        │
//! │                                                                         │
//! │  Configuration Store (glazier-db)                                      │
//! │       │  read pricing, edge rates, constants, active formula           │
//! │       ▼                                                                 │
//! │  ConfigSnapshot::new(...) ← rejects duplicates and bad constants       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  calculate_quote(&request, &snapshot)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  snapshot dropped (never cached; admin edits apply on the next call)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups are keyed the way the store's tables are keyed:
//! (thickness, material), (thickness), and (thickness, size_tier).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ts_rs::TS;

use crate::error::ConfigurationError;
use crate::formula::PricingFormula;
use crate::types::{Material, Thickness};

/// Clip leg length (inches) where the "one inch or over" tier begins.
pub const CLIP_TIER_BOUNDARY_IN: Decimal = Decimal::ONE;

/// Largest price, rate or constant the price book accepts.
///
/// Bounding every configured amount keeps the whole cost pipeline inside
/// `Decimal` range for any request that passes validation.
pub const MAX_CONFIG_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

// =============================================================================
// Pricing Entry
// =============================================================================

/// Price book row for one (thickness, material) combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingEntry {
    #[ts(as = "String")]
    pub thickness: Thickness,
    pub material: Material,
    /// Dollars per billable square foot.
    #[ts(type = "string")]
    pub base_price: Decimal,
    /// Dollars per inch of polished edge.
    #[ts(type = "string")]
    pub polish_price: Decimal,
    /// Polish at the flat shop rate instead of `polish_price`.
    pub flat_polish: bool,
    pub never_tempered: bool,
    pub only_tempered: bool,
}

impl PricingEntry {
    /// Creates an entry with no flags set.
    pub fn new(thickness: Thickness, material: Material, base_price: Decimal, polish_price: Decimal) -> Self {
        PricingEntry {
            thickness,
            material,
            base_price,
            polish_price,
            flat_polish: false,
            never_tempered: false,
            only_tempered: false,
        }
    }

    pub fn flat_polish(mut self, flat: bool) -> Self {
        self.flat_polish = flat;
        self
    }

    pub fn never_tempered(mut self, never: bool) -> Self {
        self.never_tempered = never;
        self
    }

    pub fn only_tempered(mut self, only: bool) -> Self {
        self.only_tempered = only;
        self
    }

    /// Checks prices and flag consistency.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_amount("base_price", self.base_price)?;
        check_amount("polish_price", self.polish_price)?;

        if self.never_tempered && self.only_tempered {
            return Err(ConfigurationError::ConflictingTemperFlags {
                thickness: self.thickness,
                material: self.material,
            });
        }

        Ok(())
    }

    /// Whether polish on this entry is charged at the flat shop rate.
    ///
    /// Mirror always is, whatever its own row says.
    #[inline]
    pub fn uses_flat_polish(&self) -> bool {
        self.flat_polish || self.material.is_mirror()
    }
}

// =============================================================================
// Edge Rates
// =============================================================================

/// Clipped-corner size band.
///
/// Tie-break: a clip of exactly 1.0" is `OneInchOrOver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    /// Clip leg strictly less than 1 inch.
    UnderOneInch,
    /// Clip leg of 1 inch or more.
    OneInchOrOver,
}

impl SizeTier {
    /// Selects the tier for a clip leg length in inches.
    ///
    /// ## Example
    /// ```rust
    /// use glazier_core::config::SizeTier;
    ///
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(SizeTier::for_clip(Decimal::new(99, 2)), SizeTier::UnderOneInch);
    /// assert_eq!(SizeTier::for_clip(Decimal::ONE), SizeTier::OneInchOrOver);
    /// ```
    pub fn for_clip(clip_in: Decimal) -> SizeTier {
        if clip_in < CLIP_TIER_BOUNDARY_IN {
            SizeTier::UnderOneInch
        } else {
            SizeTier::OneInchOrOver
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            SizeTier::UnderOneInch => "under_one_inch",
            SizeTier::OneInchOrOver => "one_inch_or_over",
        }
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Beveled edge rate, dollars per inch, keyed by thickness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BeveledRate {
    #[ts(as = "String")]
    pub thickness: Thickness,
    #[ts(type = "string")]
    pub rate_per_inch: Decimal,
}

impl BeveledRate {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_amount("beveled rate_per_inch", self.rate_per_inch)
    }
}

/// Clipped corner rate, dollars per corner, keyed by (thickness, tier).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClipRate {
    #[ts(as = "String")]
    pub thickness: Thickness,
    pub tier: SizeTier,
    #[ts(type = "string")]
    pub rate_per_corner: Decimal,
}

impl ClipRate {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_amount("clip rate_per_corner", self.rate_per_corner)
    }
}

// =============================================================================
// System Constants
// =============================================================================

/// Shop-wide pricing constants. Rates are fractions (0.35 = 35%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SystemConstants {
    /// Smallest area ever billed, in square feet.
    #[ts(type = "string")]
    pub minimum_billable_area: Decimal,
    #[ts(type = "string")]
    pub contractor_discount_rate: Decimal,
    /// Dollars per inch for flat-polished material.
    #[ts(type = "string")]
    pub flat_polish_rate: Decimal,
    #[ts(type = "string")]
    pub tempered_markup_rate: Decimal,
    #[ts(type = "string")]
    pub shape_markup_rate: Decimal,
}

impl SystemConstants {
    /// Checks every constant is in range.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let non_negative = [
            ("minimum_billable_area", self.minimum_billable_area),
            ("flat_polish_rate", self.flat_polish_rate),
            ("tempered_markup_rate", self.tempered_markup_rate),
            ("shape_markup_rate", self.shape_markup_rate),
        ];
        for (name, value) in non_negative {
            if value < Decimal::ZERO || value > MAX_CONFIG_AMOUNT {
                return Err(ConfigurationError::InvalidConstant {
                    name: name.to_string(),
                    value,
                });
            }
        }

        let discount = self.contractor_discount_rate;
        if !(Decimal::ZERO..=Decimal::ONE).contains(&discount) {
            return Err(ConfigurationError::InvalidConstant {
                name: "contractor_discount_rate".to_string(),
                value: discount,
            });
        }

        Ok(())
    }
}

fn check_amount(field: &str, value: Decimal) -> Result<(), ConfigurationError> {
    if value < Decimal::ZERO || value > MAX_CONFIG_AMOUNT {
        return Err(ConfigurationError::InvalidPrice {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

// =============================================================================
// Snapshot
// =============================================================================

/// Everything one calculation needs, checked once at construction.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pricing: BTreeMap<(Thickness, Material), PricingEntry>,
    beveled: BTreeMap<Thickness, Decimal>,
    clips: BTreeMap<(Thickness, SizeTier), Decimal>,
    constants: SystemConstants,
    formula: PricingFormula,
}

impl ConfigSnapshot {
    /// Builds a snapshot from raw table rows.
    ///
    /// ## Errors
    /// - duplicate keys in any table
    /// - negative or oversized prices and rates
    /// - an entry flagged both only- and never-tempered
    /// - out-of-range constants
    ///
    /// The formula is checked at evaluation time, not here.
    pub fn new(
        pricing: Vec<PricingEntry>,
        beveled: Vec<BeveledRate>,
        clips: Vec<ClipRate>,
        constants: SystemConstants,
        formula: PricingFormula,
    ) -> Result<Self, ConfigurationError> {
        constants.validate()?;

        let mut pricing_map = BTreeMap::new();
        for entry in pricing {
            entry.validate()?;
            let key = (entry.thickness, entry.material);
            if pricing_map.insert(key, entry).is_some() {
                return Err(ConfigurationError::DuplicatePricingEntry {
                    thickness: key.0,
                    material: key.1,
                });
            }
        }

        let mut beveled_map = BTreeMap::new();
        for rate in beveled {
            rate.validate()?;
            if beveled_map.insert(rate.thickness, rate.rate_per_inch).is_some() {
                return Err(ConfigurationError::DuplicateBeveledRate {
                    thickness: rate.thickness,
                });
            }
        }

        let mut clip_map = BTreeMap::new();
        for rate in clips {
            rate.validate()?;
            if clip_map
                .insert((rate.thickness, rate.tier), rate.rate_per_corner)
                .is_some()
            {
                return Err(ConfigurationError::DuplicateClipRate {
                    thickness: rate.thickness,
                    tier: rate.tier,
                });
            }
        }

        Ok(ConfigSnapshot {
            pricing: pricing_map,
            beveled: beveled_map,
            clips: clip_map,
            constants,
            formula,
        })
    }

    /// Looks up a pricing entry without failing.
    pub fn find_pricing_entry(&self, thickness: Thickness, material: Material) -> Option<&PricingEntry> {
        self.pricing.get(&(thickness, material))
    }

    pub fn pricing_entry(
        &self,
        thickness: Thickness,
        material: Material,
    ) -> Result<&PricingEntry, ConfigurationError> {
        self.find_pricing_entry(thickness, material)
            .ok_or(ConfigurationError::MissingPricingEntry {
                thickness,
                material,
            })
    }

    pub fn beveled_rate(&self, thickness: Thickness) -> Result<Decimal, ConfigurationError> {
        self.beveled
            .get(&thickness)
            .copied()
            .ok_or(ConfigurationError::MissingBeveledRate { thickness })
    }

    pub fn clip_rate(&self, thickness: Thickness, tier: SizeTier) -> Result<Decimal, ConfigurationError> {
        self.clips
            .get(&(thickness, tier))
            .copied()
            .ok_or(ConfigurationError::MissingClipRate { thickness, tier })
    }

    /// The thinnest thickness stocked in any material.
    ///
    /// "Thinnest" is relative to the rows currently in the price book, not a
    /// fixed 1/8". Deleting every 1/8" row makes 3/16" the thinnest, and from
    /// then on 3/16" requests draw all of the thin-glass rules.
    pub fn thinnest_thickness(&self) -> Option<Thickness> {
        self.pricing.keys().map(|(thickness, _)| *thickness).min()
    }

    pub fn pricing_entries(&self) -> impl Iterator<Item = &PricingEntry> {
        self.pricing.values()
    }

    pub fn constants(&self) -> &SystemConstants {
        &self.constants
    }

    pub fn formula(&self) -> &PricingFormula {
        &self.formula
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
