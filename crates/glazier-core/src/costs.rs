//! # Cost Accumulator
//!
//! Sums the per-piece cost components before markups.
//!
//! ```text
//!   base            billable_area × base_price
//! + polish          perimeter × (flat_polish_rate | polish_price)
//! + beveled         perimeter × beveled_rate(thickness)
//! + clipped corners corner_count × clip_rate(thickness, tier)
//! ─────────────────────────────────────────────────────────────
//! = pre_markup_subtotal
//! ```
//!
//! A term is zero when the customer did not select it or its component is
//! disabled, and its rate is never looked up in that case.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::{ConfigSnapshot, SizeTier};
use crate::error::ConfigurationError;
use crate::formula::ComponentToggles;
use crate::geometry::Geometry;
use crate::types::QuoteRequest;

/// Per-component costs for one piece, in dollars, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostBreakdown {
    #[ts(type = "string")]
    pub base_cost: Decimal,
    /// Rate charged per inch of polish, when polish was charged.
    #[ts(type = "string | null")]
    pub polish_rate: Option<Decimal>,
    #[ts(type = "string")]
    pub polish_cost: Decimal,
    #[ts(type = "string")]
    pub beveled_cost: Decimal,
    #[ts(type = "string")]
    pub clipped_corners_cost: Decimal,
    #[ts(type = "string")]
    pub pre_markup_subtotal: Decimal,
}

/// Computes the enabled cost components for a validated request.
///
/// ## Errors
/// [`ConfigurationError`] when a needed pricing entry or rate row is missing.
pub fn accumulate(
    request: &QuoteRequest,
    geometry: &Geometry,
    snapshot: &ConfigSnapshot,
) -> Result<CostBreakdown, ConfigurationError> {
    let toggles: ComponentToggles = snapshot.formula().components;
    let constants = snapshot.constants();
    let entry = snapshot.pricing_entry(request.thickness, request.material)?;

    let base_cost = if toggles.base {
        geometry.billable_area_sqft * entry.base_price
    } else {
        Decimal::ZERO
    };

    let polish_rate = if request.polish && toggles.polish {
        Some(if entry.uses_flat_polish() {
            constants.flat_polish_rate
        } else {
            entry.polish_price
        })
    } else {
        None
    };
    let polish_cost = polish_rate.map_or(Decimal::ZERO, |rate| geometry.perimeter_in * rate);

    let beveled_cost = if request.beveled && toggles.beveled {
        geometry.perimeter_in * snapshot.beveled_rate(request.thickness)?
    } else {
        Decimal::ZERO
    };

    let clips_apply = request.corner_count > 0
        && !request.shape.is_circular()
        && !request.material.is_mirror()
        && toggles.clipped_corners;
    let clipped_corners_cost = if clips_apply {
        let tier = SizeTier::for_clip(request.corner_clip_in.unwrap_or_default());
        Decimal::from(request.corner_count) * snapshot.clip_rate(request.thickness, tier)?
    } else {
        Decimal::ZERO
    };

    Ok(CostBreakdown {
        base_cost,
        polish_rate,
        polish_cost,
        beveled_cost,
        clipped_corners_cost,
        pre_markup_subtotal: base_cost + polish_cost + beveled_cost + clipped_corners_cost,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BeveledRate, ClipRate, PricingEntry, SystemConstants};
    use crate::formula::{Component, PriceConversion, PricingFormula};
    use crate::geometry::resolve;
    use crate::types::{Material, Shape, Thickness};
    use rust_decimal_macros::dec;

    const QUARTER: Thickness = Thickness::from_sixteenths(4);
    const HALF: Thickness = Thickness::from_sixteenths(8);

    fn snapshot(toggles: ComponentToggles) -> ConfigSnapshot {
        ConfigSnapshot::new(
            vec![
                PricingEntry::new(QUARTER, Material::Clear, dec!(12.50), dec!(0.85)),
                PricingEntry::new(QUARTER, Material::Mirror, dec!(15.00), dec!(0.85)),
                PricingEntry::new(QUARTER, Material::Frosted, dec!(16.00), dec!(0.85)).flat_polish(true),
                PricingEntry::new(HALF, Material::Clear, dec!(22.00), dec!(1.25)),
            ],
            vec![BeveledRate { thickness: QUARTER, rate_per_inch: dec!(1.10) }],
            vec![
                ClipRate { thickness: QUARTER, tier: SizeTier::UnderOneInch, rate_per_corner: dec!(4.00) },
                ClipRate { thickness: QUARTER, tier: SizeTier::OneInchOrOver, rate_per_corner: dec!(6.50) },
            ],
            SystemConstants {
                minimum_billable_area: dec!(3.0),
                contractor_discount_rate: dec!(0.10),
                flat_polish_rate: dec!(0.27),
                tempered_markup_rate: dec!(0.35),
                shape_markup_rate: dec!(0.25),
            },
            PricingFormula::new(PriceConversion::Divisor { value: dec!(0.28) }).components(toggles),
        )
        .unwrap()
    }

    fn costs(request: &QuoteRequest, toggles: ComponentToggles) -> Result<CostBreakdown, ConfigurationError> {
        let snapshot = snapshot(toggles);
        let geometry = resolve(&request.shape, snapshot.constants().minimum_billable_area);
        accumulate(request, &geometry, &snapshot)
    }

    fn rect(material: Material, thickness: Thickness) -> QuoteRequest {
        QuoteRequest::new(
            Shape::Rectangular { width_in: dec!(24), height_in: dec!(36) },
            material,
            thickness,
        )
    }

    #[test]
    fn test_base_and_polish() {
        let breakdown = costs(&rect(Material::Clear, QUARTER).polished(true), ComponentToggles::default()).unwrap();
        assert_eq!(breakdown.base_cost, dec!(75));
        assert_eq!(breakdown.polish_cost, dec!(102));
        assert_eq!(breakdown.polish_rate, Some(dec!(0.85)));
        assert_eq!(breakdown.pre_markup_subtotal, dec!(177));
    }

    #[test]
    fn test_flat_polish_rate() {
        let mirror = costs(&rect(Material::Mirror, QUARTER).polished(true), ComponentToggles::default()).unwrap();
        assert_eq!(mirror.polish_rate, Some(dec!(0.27)));

        let frosted = costs(&rect(Material::Frosted, QUARTER).polished(true), ComponentToggles::default()).unwrap();
        assert_eq!(frosted.polish_rate, Some(dec!(0.27)));
    }

    #[test]
    fn test_beveled_and_clips() {
        let request = rect(Material::Clear, QUARTER).beveled(true).clipped_corners(2, dec!(1.0));
        let breakdown = costs(&request, ComponentToggles::default()).unwrap();
        assert_eq!(breakdown.beveled_cost, dec!(132));
        assert_eq!(breakdown.clipped_corners_cost, dec!(13));

        let small_clips = rect(Material::Clear, QUARTER).clipped_corners(2, dec!(0.75));
        assert_eq!(costs(&small_clips, ComponentToggles::default()).unwrap().clipped_corners_cost, dec!(8));
    }

    #[test]
    fn test_missing_rates_only_when_needed() {
        let plain = rect(Material::Clear, HALF);
        assert!(costs(&plain, ComponentToggles::default()).is_ok());

        let beveled = rect(Material::Clear, HALF).beveled(true);
        assert!(matches!(
            costs(&beveled, ComponentToggles::default()),
            Err(ConfigurationError::MissingBeveledRate { .. })
        ));

        let disabled = ComponentToggles::default().with(Component::Beveled, false);
        assert_eq!(costs(&beveled, disabled).unwrap().beveled_cost, Decimal::ZERO);

        let clipped = rect(Material::Clear, HALF).clipped_corners(1, dec!(0.5));
        assert!(matches!(
            costs(&clipped, ComponentToggles::default()),
            Err(ConfigurationError::MissingClipRate { .. })
        ));
    }

    #[test]
    fn test_missing_pricing_entry() {
        assert!(matches!(
            costs(&rect(Material::Tinted, QUARTER), ComponentToggles::default()),
            Err(ConfigurationError::MissingPricingEntry { .. })
        ));
    }

    #[test]
    fn test_disabled_polish_zeroes_only_polish() {
        let request = rect(Material::Clear, QUARTER).polished(true).clipped_corners(1, dec!(0.5));
        let enabled = costs(&request, ComponentToggles::default()).unwrap();
        let disabled = costs(&request, ComponentToggles::default().with(Component::Polish, false)).unwrap();

        assert_eq!(disabled.polish_cost, Decimal::ZERO);
        assert_eq!(disabled.polish_rate, None);
        assert_eq!(disabled.base_cost, enabled.base_cost);
        assert_eq!(disabled.clipped_corners_cost, enabled.clipped_corners_cost);
    }
}
