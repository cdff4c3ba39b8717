//! # Quote Pipeline
//!
//! Runs one request through every stage against one snapshot.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         calculate_quote()                               │
//! │                                                                         │
//! │  QuoteRequest + ConfigSnapshot                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validation::validate_request ──── Err ──► ValidationError (all rules) │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  geometry::resolve           area, perimeter, minimum floor            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  costs::accumulate ─────────────── Err ──► ConfigurationError          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  markup::apply               markups, discount, × quantity             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  formula::convert_to_quote ─────── Err ──► FormulaError                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  QuoteResult (price in whole cents)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline is a pure function of its inputs and holds no state, so it
//! is safe to call from any number of tasks at once.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::ConfigSnapshot;
use crate::costs::{self, CostBreakdown};
use crate::error::{QuoteError, RuleViolation};
use crate::formula::convert_to_quote;
use crate::geometry::{self, Geometry};
use crate::markup::{self, Adjustments};
use crate::money::Money;
use crate::types::QuoteRequest;
use crate::validation::validate_request;

/// Message the quotation form shows for any configuration problem.
pub const PRICING_UNAVAILABLE: &str = "Pricing unavailable for this combination";

// =============================================================================
// Result
// =============================================================================

/// Full breakdown of a priced request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteResult {
    pub geometry: Geometry,
    pub costs: CostBreakdown,
    pub adjustments: Adjustments,
    pub quantity: u32,
    /// Customer price for the whole line, in cents.
    pub quote_price: Money,
    /// Version of the formula that produced `quote_price`.
    pub formula_version: i64,
}

/// Prices a request.
///
/// ## Errors
/// - [`QuoteError::Validation`] with every violated rule
/// - [`QuoteError::Configuration`] when the price book cannot cover the request
/// - [`QuoteError::Formula`] when the active formula cannot produce a price
pub fn calculate_quote(request: &QuoteRequest, snapshot: &ConfigSnapshot) -> Result<QuoteResult, QuoteError> {
    validate_request(request, snapshot)?;

    let constants = snapshot.constants();
    let formula = snapshot.formula();

    let geometry = geometry::resolve(&request.shape, constants.minimum_billable_area);
    let costs = costs::accumulate(request, &geometry, snapshot)?;
    let adjustments = markup::apply(costs.pre_markup_subtotal, request, constants, &formula.components);
    let quote_price = convert_to_quote(adjustments.total, formula)?;

    Ok(QuoteResult {
        geometry,
        costs,
        adjustments,
        quantity: request.quantity,
        quote_price,
        formula_version: formula.version,
    })
}

// =============================================================================
// Outcome
// =============================================================================

/// Serializable result of a quote call, tagged by `status`.
///
/// ```json
/// { "status": "validation_error", "violations": [ { "rule": "mirror_temper", ... } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuoteOutcome {
    Success { result: QuoteResult },
    ValidationError { violations: Vec<RuleViolation> },
    ConfigurationError { message: String, detail: String },
    FormulaError { message: String },
}

impl QuoteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, QuoteOutcome::Success { .. })
    }

    /// The price, if the quote succeeded.
    pub fn quote_price(&self) -> Option<Money> {
        match self {
            QuoteOutcome::Success { result } => Some(result.quote_price),
            _ => None,
        }
    }
}

impl From<QuoteError> for QuoteOutcome {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::Validation(err) => QuoteOutcome::ValidationError {
                violations: err.violations,
            },
            QuoteError::Configuration(err) => QuoteOutcome::ConfigurationError {
                message: PRICING_UNAVAILABLE.to_string(),
                detail: err.to_string(),
            },
            QuoteError::Formula(err) => QuoteOutcome::FormulaError {
                message: err.to_string(),
            },
        }
    }
}

impl From<Result<QuoteResult, QuoteError>> for QuoteOutcome {
    fn from(result: Result<QuoteResult, QuoteError>) -> Self {
        match result {
            Ok(result) => QuoteOutcome::Success { result },
            Err(err) => err.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BeveledRate, ClipRate, PricingEntry, SizeTier, SystemConstants};
    use crate::error::ConfigurationError;
    use crate::formula::{Component, ComponentToggles, PriceConversion, PricingFormula};
    use crate::types::{Material, Shape, Thickness};
    use crate::validation::RuleId;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const EIGHTH: Thickness = Thickness::from_sixteenths(2);
    const QUARTER: Thickness = Thickness::from_sixteenths(4);

    fn snapshot_with(formula: PricingFormula) -> ConfigSnapshot {
        ConfigSnapshot::new(
            vec![
                PricingEntry::new(EIGHTH, Material::Clear, dec!(8.00), dec!(0.60)),
                PricingEntry::new(QUARTER, Material::Clear, dec!(12.50), dec!(0.85)),
                PricingEntry::new(QUARTER, Material::Mirror, dec!(15.00), dec!(0.85)),
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
            formula,
        )
        .unwrap()
    }

    fn divisor() -> PricingFormula {
        PricingFormula::new(PriceConversion::Divisor { value: dec!(0.28) })
    }

    fn snapshot() -> ConfigSnapshot {
        snapshot_with(divisor())
    }

    fn rect(width_in: Decimal, height_in: Decimal) -> Shape {
        Shape::Rectangular { width_in, height_in }
    }

    #[test]
    fn test_rectangle_polished_tempered() {
        let request = QuoteRequest::new(rect(dec!(24), dec!(36)), Material::Clear, QUARTER)
            .polished(true)
            .tempered(true);

        let result = calculate_quote(&request, &snapshot()).unwrap();

        assert_eq!(result.geometry.actual_area_sqft, dec!(6));
        assert_eq!(result.costs.base_cost, dec!(75));
        assert_eq!(result.geometry.perimeter_in, dec!(120));
        assert_eq!(result.costs.polish_cost, dec!(102));
        assert_eq!(result.costs.pre_markup_subtotal, dec!(177));
        assert_eq!(result.adjustments.tempered_markup, dec!(61.95));
        assert_eq!(result.adjustments.total, dec!(238.95));
        assert_eq!(result.quote_price, Money::from_cents(85339));
    }

    #[test]
    fn test_small_piece_billed_at_minimum() {
        let request = QuoteRequest::new(rect(dec!(12), dec!(12)), Material::Clear, QUARTER);

        let result = calculate_quote(&request, &snapshot()).unwrap();

        assert_eq!(result.geometry.actual_area_sqft, dec!(1));
        assert_eq!(result.geometry.billable_area_sqft, dec!(3));
        assert!(result.geometry.minimum_applied);
        assert_eq!(result.costs.base_cost, dec!(37.5));
        assert_eq!(result.quote_price, Money::from_cents(13393));
    }

    #[test]
    fn test_exact_half_cent_total_rounds_up() {
        // 3 sqft × 12.50 + 42" × 0.85 = 73.20; × 1.35 = 98.82; × 0.9 = 88.938; × 2.5 = 222.345
        let formula = PricingFormula::new(PriceConversion::Multiplier { value: dec!(2.5) });
        let request = QuoteRequest::new(rect(dec!(10), dec!(11)), Material::Clear, QUARTER)
            .polished(true)
            .tempered(true)
            .contractor(true);

        let result = calculate_quote(&request, &snapshot_with(formula)).unwrap();

        assert!(result.geometry.minimum_applied);
        assert_eq!(result.costs.pre_markup_subtotal, dec!(73.20));
        assert_eq!(result.adjustments.post_markup_subtotal, dec!(98.82));
        assert_eq!(result.adjustments.total, dec!(88.938));
        assert_eq!(result.quote_price, Money::from_cents(22235));
    }

    #[test]
    fn test_polished_mirror_circle() {
        let formula = divisor().components(ComponentToggles::default().with(Component::ShapeMarkup, false));
        let request = QuoteRequest::new(Shape::Circular { diameter_in: dec!(30) }, Material::Mirror, QUARTER)
            .polished(true);

        let result = calculate_quote(&request, &snapshot_with(formula)).unwrap();

        assert!((result.geometry.actual_area_sqft - dec!(4.91)).abs() < dec!(0.005));
        assert!((result.geometry.perimeter_in - dec!(94.25)).abs() < dec!(0.005));
        assert!((result.costs.base_cost - dec!(73.63)).abs() < dec!(0.005));
        assert_eq!(result.costs.polish_rate, Some(dec!(0.27)));
        assert!((result.costs.polish_cost - dec!(25.45)).abs() < dec!(0.005));
        assert_eq!(result.adjustments.shape_markup, Decimal::ZERO);
        // Unrounded intermediates give 353.85; hand-rounded ones give 353.86.
        assert!((result.quote_price.cents() - 35386).abs() <= 1);
    }

    #[test]
    fn test_divisor_and_multiplier_quotes_match() {
        let request = QuoteRequest::new(rect(dec!(24), dec!(36)), Material::Clear, QUARTER)
            .polished(true)
            .tempered(true);

        let by_divisor = calculate_quote(&request, &snapshot()).unwrap();
        let multiplier = PricingFormula::new(PriceConversion::Multiplier { value: dec!(3.5714) });
        let by_multiplier = calculate_quote(&request, &snapshot_with(multiplier)).unwrap();

        assert!((by_divisor.quote_price.cents() - by_multiplier.quote_price.cents()).abs() <= 1);
    }

    fn component_value(result: &QuoteResult, component: Component) -> Decimal {
        match component {
            Component::Base => result.costs.base_cost,
            Component::Polish => result.costs.polish_cost,
            Component::Beveled => result.costs.beveled_cost,
            Component::ClippedCorners => result.costs.clipped_corners_cost,
            Component::TemperedMarkup => result.adjustments.tempered_markup,
            Component::ShapeMarkup => result.adjustments.shape_markup,
            Component::ContractorDiscount => result.adjustments.contractor_discount,
        }
    }

    const COST_COMPONENTS: [Component; 4] = [
        Component::Base,
        Component::Polish,
        Component::Beveled,
        Component::ClippedCorners,
    ];

    #[test]
    fn test_disabling_one_component_zeroes_only_it() {
        let request = QuoteRequest::new(
            Shape::Irregular { width_in: dec!(24), height_in: dec!(36) },
            Material::Clear,
            QUARTER,
        )
        .polished(true)
        .beveled(true)
        .tempered(true)
        .contractor(true)
        .clipped_corners(2, dec!(0.5));

        let full = calculate_quote(&request, &snapshot()).unwrap();
        for component in Component::ALL {
            assert!(component_value(&full, component) > Decimal::ZERO, "{component:?} should be charged");
        }

        for disabled in Component::ALL {
            let formula = divisor().components(ComponentToggles::default().with(disabled, false));
            let result = calculate_quote(&request, &snapshot_with(formula)).unwrap();

            assert_eq!(component_value(&result, disabled), Decimal::ZERO, "{disabled:?}");
            for other in COST_COMPONENTS.into_iter().filter(|c| *c != disabled) {
                assert_eq!(component_value(&result, other), component_value(&full, other), "{other:?}");
            }
        }
    }

    #[test]
    fn test_quantity_extends_price() {
        let single = QuoteRequest::new(rect(dec!(24), dec!(36)), Material::Clear, QUARTER);
        let one = calculate_quote(&single, &snapshot()).unwrap();
        let five = calculate_quote(&single.clone().quantity(5), &snapshot()).unwrap();

        assert_eq!(five.quantity, 5);
        assert_eq!(five.adjustments.total, one.adjustments.total * dec!(5));
    }

    #[test]
    fn test_price_always_has_two_decimals() {
        let shapes = [
            rect(dec!(17.3), dec!(29.9)),
            Shape::Circular { diameter_in: dec!(13.7) },
            Shape::Irregular { width_in: dec!(41.1), height_in: dec!(7.3) },
        ];
        for shape in shapes {
            let request = QuoteRequest::new(shape, Material::Clear, QUARTER).polished(true);
            let price = calculate_quote(&request, &snapshot()).unwrap().quote_price;
            let text = price.to_string();
            let decimals = text.split('.').nth(1).unwrap();
            assert_eq!(decimals.len(), 2, "{text}");
        }
    }

    #[test]
    fn test_oversized_piece_rejected_before_pricing() {
        let request = QuoteRequest::new(
            rect(Decimal::MAX, Decimal::MAX),
            Material::Clear,
            QUARTER,
        );
        assert!(matches!(
            calculate_quote(&request, &snapshot()),
            Err(QuoteError::Validation(ref err)) if err.contains(RuleId::DimensionsInRange)
        ));
    }

    #[test]
    fn test_validation_error_outcome() {
        let request = QuoteRequest::new(
            Shape::Circular { diameter_in: dec!(20) },
            Material::Mirror,
            QUARTER,
        )
        .tempered(true)
        .clipped_corners(2, dec!(0.5));

        let outcome = QuoteOutcome::from(calculate_quote(&request, &snapshot()));
        match &outcome {
            QuoteOutcome::ValidationError { violations } => {
                let ids: Vec<RuleId> = violations.iter().map(|v| v.rule).collect();
                assert_eq!(
                    ids,
                    vec![RuleId::MirrorTemper, RuleId::MirrorClippedCorners, RuleId::CircularClippedCorners]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "validation_error");
        assert_eq!(json["violations"][0]["rule"], "mirror_temper");
    }

    #[test]
    fn test_configuration_error_outcome() {
        let request = QuoteRequest::new(rect(dec!(24), dec!(36)), Material::Tinted, QUARTER);
        let result = calculate_quote(&request, &snapshot());
        assert!(matches!(
            result,
            Err(QuoteError::Configuration(ConfigurationError::MissingPricingEntry { .. }))
        ));

        let json = serde_json::to_value(QuoteOutcome::from(result)).unwrap();
        assert_eq!(json["status"], "configuration_error");
        assert_eq!(json["message"], PRICING_UNAVAILABLE);
    }

    #[test]
    fn test_formula_error_outcome() {
        let formula = PricingFormula::new(PriceConversion::Divisor { value: dec!(0) });
        let request = QuoteRequest::new(rect(dec!(24), dec!(36)), Material::Clear, QUARTER);
        let outcome = QuoteOutcome::from(calculate_quote(&request, &snapshot_with(formula)));

        assert!(!outcome.is_success());
        assert_eq!(
            outcome,
            QuoteOutcome::FormulaError { message: "divisor must not be zero".to_string() }
        );
    }

    #[test]
    fn test_success_outcome_json() {
        let request = QuoteRequest::new(rect(dec!(12), dec!(12)), Material::Clear, QUARTER);
        let outcome = QuoteOutcome::from(calculate_quote(&request, &snapshot()));
        assert_eq!(outcome.quote_price(), Some(Money::from_cents(13393)));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["result"]["quote_price"], 13393);
        assert!(json["result"]["costs"]["base_cost"].is_string());
        assert_eq!(json["result"]["geometry"]["minimum_applied"], true);
    }
}
