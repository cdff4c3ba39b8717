//! # Validation Module
//!
//! Business-rule validation for quote requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Quotation form (React)                                       │
//! │  ├── Greys out impossible options                                      │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Deserialization                                              │
//! │  └── Shape carries its own dimensions, enums are closed                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                  │
//! │  ├── Every rule in RULES evaluated against the snapshot                │
//! │  └── ALL violations returned together                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rules are data: adding one means adding a row to [`RULES`], not a new
//! branch in the pipeline.
//!
//! ## Usage
//! ```rust,no_run
//! use glazier_core::config::ConfigSnapshot;
//! use glazier_core::types::QuoteRequest;
//! use glazier_core::validation::validate_request;
//!
//! fn check(request: &QuoteRequest, snapshot: &ConfigSnapshot) {
//!     if let Err(err) = validate_request(request, snapshot) {
//!         for violation in &err.violations {
//!             println!("{}: {}", violation.field, violation.message);
//!         }
//!     }
//! }
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::config::{ConfigSnapshot, PricingEntry};
use crate::error::{RuleViolation, ValidationError};
use crate::types::{QuoteRequest, Thickness};
use crate::{MAX_CLIPPED_CORNERS, MAX_DIMENSION_IN, MAX_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Rule Identifiers
// =============================================================================

/// Stable identifier of a pricing rule. Serialized for the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    DimensionsPositive,
    DimensionsInRange,
    QuantityRange,
    CornerCountRange,
    ClipSizeRequired,
    ThinGlassPolish,
    ThinGlassBevel,
    ThinGlassTemper,
    ThinGlassMirror,
    MirrorTemper,
    MirrorClippedCorners,
    CircularClippedCorners,
    OnlyTempered,
    NeverTempered,
}

impl RuleId {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RuleId::DimensionsPositive => "dimensions_positive",
            RuleId::DimensionsInRange => "dimensions_in_range",
            RuleId::QuantityRange => "quantity_range",
            RuleId::CornerCountRange => "corner_count_range",
            RuleId::ClipSizeRequired => "clip_size_required",
            RuleId::ThinGlassPolish => "thin_glass_polish",
            RuleId::ThinGlassBevel => "thin_glass_bevel",
            RuleId::ThinGlassTemper => "thin_glass_temper",
            RuleId::ThinGlassMirror => "thin_glass_mirror",
            RuleId::MirrorTemper => "mirror_temper",
            RuleId::MirrorClippedCorners => "mirror_clipped_corners",
            RuleId::CircularClippedCorners => "circular_clipped_corners",
            RuleId::OnlyTempered => "only_tempered",
            RuleId::NeverTempered => "never_tempered",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rule Table
// =============================================================================

/// What a predicate sees: the request plus the snapshot facts it depends on.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub request: &'a QuoteRequest,
    /// Entry for the requested (thickness, material), if the price book has one.
    pub entry: Option<&'a PricingEntry>,
    /// Thinnest thickness stocked in any material.
    pub thinnest: Option<Thickness>,
}

impl<'a> RuleContext<'a> {
    pub fn new(request: &'a QuoteRequest, snapshot: &'a ConfigSnapshot) -> Self {
        RuleContext {
            request,
            entry: snapshot.find_pricing_entry(request.thickness, request.material),
            thinnest: snapshot.thinnest_thickness(),
        }
    }

    fn is_thinnest(&self) -> bool {
        self.thinnest == Some(self.request.thickness)
    }

    fn has_corners(&self) -> bool {
        self.request.corner_count > 0
    }
}

/// One row of the rule table.
pub struct Rule {
    pub id: RuleId,
    /// Form field the UI should highlight.
    pub field: &'static str,
    pub message: &'static str,
    /// Returns true when the request breaks the rule.
    pub violated: fn(&RuleContext<'_>) -> bool,
}

impl Rule {
    fn violation(&self) -> RuleViolation {
        RuleViolation {
            rule: self.id,
            field: self.field.to_string(),
            message: self.message.to_string(),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("field", &self.field)
            .field("message", &self.message)
            .finish()
    }
}

/// Every rule a request must satisfy, evaluated in order.
pub static RULES: &[Rule] = &[
    // Input sanity
    Rule {
        id: RuleId::DimensionsPositive,
        field: "shape",
        message: "Dimensions must be positive numbers",
        violated: |ctx| {
            ctx.request
                .shape
                .dimensions()
                .iter()
                .any(|(_, inches)| *inches <= Decimal::ZERO)
        },
    },
    Rule {
        id: RuleId::DimensionsInRange,
        field: "shape",
        message: "Dimensions cannot exceed 1200 inches",
        violated: |ctx| {
            ctx.request
                .shape
                .dimensions()
                .iter()
                .any(|(_, inches)| *inches > MAX_DIMENSION_IN)
        },
    },
    Rule {
        id: RuleId::QuantityRange,
        field: "quantity",
        message: "Quantity must be between 1 and 999",
        violated: |ctx| ctx.request.quantity < 1 || ctx.request.quantity > MAX_QUANTITY,
    },
    Rule {
        id: RuleId::CornerCountRange,
        field: "corner_count",
        message: "A piece has at most 4 corners to clip",
        violated: |ctx| ctx.request.corner_count > MAX_CLIPPED_CORNERS,
    },
    Rule {
        id: RuleId::ClipSizeRequired,
        field: "corner_clip_in",
        message: "Clipped corners need a clip size",
        violated: |ctx| {
            ctx.has_corners()
                && !matches!(ctx.request.corner_clip_in, Some(clip) if clip > Decimal::ZERO)
        },
    },
    // Thinnest stocked glass
    Rule {
        id: RuleId::ThinGlassPolish,
        field: "polish",
        message: "The thinnest glass cannot be polished",
        violated: |ctx| ctx.is_thinnest() && ctx.request.polish,
    },
    Rule {
        id: RuleId::ThinGlassBevel,
        field: "beveled",
        message: "The thinnest glass cannot be beveled",
        violated: |ctx| ctx.is_thinnest() && ctx.request.beveled,
    },
    Rule {
        id: RuleId::ThinGlassTemper,
        field: "tempered",
        message: "The thinnest glass cannot be tempered",
        violated: |ctx| ctx.is_thinnest() && ctx.request.tempered,
    },
    Rule {
        id: RuleId::ThinGlassMirror,
        field: "material",
        message: "Mirror is not available in the thinnest glass",
        violated: |ctx| ctx.is_thinnest() && ctx.request.material.is_mirror(),
    },
    // Mirror
    Rule {
        id: RuleId::MirrorTemper,
        field: "tempered",
        message: "Mirror cannot be tempered",
        violated: |ctx| ctx.request.material.is_mirror() && ctx.request.tempered,
    },
    Rule {
        id: RuleId::MirrorClippedCorners,
        field: "corner_count",
        message: "Mirror cannot have clipped corners",
        violated: |ctx| ctx.request.material.is_mirror() && ctx.has_corners(),
    },
    // Shape
    Rule {
        id: RuleId::CircularClippedCorners,
        field: "corner_count",
        message: "Circles have no corners to clip",
        violated: |ctx| ctx.request.shape.is_circular() && ctx.has_corners(),
    },
    // Price book flags
    Rule {
        id: RuleId::OnlyTempered,
        field: "tempered",
        message: "This glass is only sold tempered",
        violated: |ctx| ctx.entry.is_some_and(|e| e.only_tempered) && !ctx.request.tempered,
    },
    Rule {
        id: RuleId::NeverTempered,
        field: "tempered",
        message: "This glass cannot be tempered",
        violated: |ctx| ctx.entry.is_some_and(|e| e.never_tempered) && ctx.request.tempered,
    },
];

// =============================================================================
// Validators
// =============================================================================

/// Evaluates every rule and returns the ones the request breaks.
///
/// A missing pricing entry is not a violation here; the cost stage reports it
/// as a configuration error.
pub fn violations(request: &QuoteRequest, snapshot: &ConfigSnapshot) -> Vec<RuleViolation> {
    let ctx = RuleContext::new(request, snapshot);
    RULES
        .iter()
        .filter(|rule| (rule.violated)(&ctx))
        .map(Rule::violation)
        .collect()
}

/// Validates a request against the rule table.
///
/// ## Returns
/// `Ok(())`, or a [`ValidationError`] listing every violated rule.
pub fn validate_request(request: &QuoteRequest, snapshot: &ConfigSnapshot) -> ValidationResult<()> {
    let violations = violations(request, snapshot);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BeveledRate, SystemConstants};
    use crate::formula::{PriceConversion, PricingFormula};
    use crate::types::{Material, Shape};
    use rust_decimal_macros::dec;

    const EIGHTH: Thickness = Thickness::from_sixteenths(2);
    const QUARTER: Thickness = Thickness::from_sixteenths(4);

    fn snapshot() -> ConfigSnapshot {
        ConfigSnapshot::new(
            vec![
                PricingEntry::new(EIGHTH, Material::Clear, dec!(8.00), dec!(0.60)),
                PricingEntry::new(QUARTER, Material::Clear, dec!(12.50), dec!(0.85)),
                PricingEntry::new(QUARTER, Material::Mirror, dec!(15.00), dec!(0.85)),
                PricingEntry::new(QUARTER, Material::LowIron, dec!(18.00), dec!(0.85)).never_tempered(true),
                PricingEntry::new(QUARTER, Material::Frosted, dec!(16.00), dec!(0.85)).only_tempered(true),
            ],
            vec![BeveledRate { thickness: QUARTER, rate_per_inch: dec!(1.10) }],
            vec![],
            constants(),
            PricingFormula::new(PriceConversion::Divisor { value: dec!(0.28) }),
        )
        .unwrap()
    }

    fn constants() -> SystemConstants {
        SystemConstants {
            minimum_billable_area: dec!(3.0),
            contractor_discount_rate: dec!(0.10),
            flat_polish_rate: dec!(0.27),
            tempered_markup_rate: dec!(0.35),
            shape_markup_rate: dec!(0.25),
        }
    }

    fn rect() -> Shape {
        Shape::Rectangular { width_in: dec!(24), height_in: dec!(36) }
    }

    fn rule_ids(request: &QuoteRequest) -> Vec<RuleId> {
        violations(request, &snapshot()).into_iter().map(|v| v.rule).collect()
    }

    #[test]
    fn test_valid_request_passes() {
        let request = QuoteRequest::new(rect(), Material::Clear, QUARTER)
            .polished(true)
            .tempered(true)
            .clipped_corners(2, dec!(0.5));
        assert!(validate_request(&request, &snapshot()).is_ok());
    }

    #[test]
    fn test_thinnest_glass_options() {
        let request = QuoteRequest::new(rect(), Material::Clear, EIGHTH)
            .polished(true)
            .beveled(true)
            .tempered(true);
        assert_eq!(
            rule_ids(&request),
            vec![RuleId::ThinGlassPolish, RuleId::ThinGlassBevel, RuleId::ThinGlassTemper]
        );
    }

    #[test]
    fn test_thinnest_moves_up_when_eighth_rows_are_removed() {
        let three_sixteenths = Thickness::from_sixteenths(3);
        let without_eighth = ConfigSnapshot::new(
            vec![
                PricingEntry::new(three_sixteenths, Material::Clear, dec!(10.00), dec!(0.70)),
                PricingEntry::new(QUARTER, Material::Clear, dec!(12.50), dec!(0.85)),
            ],
            vec![],
            vec![],
            constants(),
            PricingFormula::new(PriceConversion::Divisor { value: dec!(0.28) }),
        )
        .unwrap();

        let polished = QuoteRequest::new(rect(), Material::Clear, three_sixteenths).polished(true);
        let ids: Vec<RuleId> = violations(&polished, &without_eighth).into_iter().map(|v| v.rule).collect();
        assert_eq!(ids, vec![RuleId::ThinGlassPolish]);

        // With 1/8" back in the book, the same request is allowed.
        let mut with_eighth = snapshot().pricing_entries().cloned().collect::<Vec<_>>();
        with_eighth.push(PricingEntry::new(three_sixteenths, Material::Clear, dec!(10.00), dec!(0.70)));
        let restored = ConfigSnapshot::new(
            with_eighth,
            vec![],
            vec![],
            constants(),
            PricingFormula::new(PriceConversion::Divisor { value: dec!(0.28) }),
        )
        .unwrap();
        assert!(violations(&polished, &restored).is_empty());
    }

    #[test]
    fn test_thinnest_glass_plain_is_fine() {
        let request = QuoteRequest::new(rect(), Material::Clear, EIGHTH);
        assert!(rule_ids(&request).is_empty());
    }

    #[test]
    fn test_thinnest_mirror_rejected_without_pricing_entry() {
        let request = QuoteRequest::new(rect(), Material::Mirror, EIGHTH);
        assert_eq!(rule_ids(&request), vec![RuleId::ThinGlassMirror]);
    }

    #[test]
    fn test_mirror_rules_collect_every_violation() {
        let request = QuoteRequest::new(rect(), Material::Mirror, QUARTER)
            .tempered(true)
            .clipped_corners(2, dec!(0.5));
        let err = validate_request(&request, &snapshot()).unwrap_err();

        assert_eq!(err.violations.len(), 2);
        assert!(err.contains(RuleId::MirrorTemper));
        assert!(err.contains(RuleId::MirrorClippedCorners));
    }

    #[test]
    fn test_circle_cannot_have_clipped_corners() {
        let request =
            QuoteRequest::new(Shape::Circular { diameter_in: dec!(30) }, Material::Clear, QUARTER)
                .clipped_corners(1, dec!(1.0));
        assert_eq!(rule_ids(&request), vec![RuleId::CircularClippedCorners]);
    }

    #[test]
    fn test_tempering_flags() {
        let low_iron = QuoteRequest::new(rect(), Material::LowIron, QUARTER).tempered(true);
        assert_eq!(rule_ids(&low_iron), vec![RuleId::NeverTempered]);

        let frosted = QuoteRequest::new(rect(), Material::Frosted, QUARTER);
        assert_eq!(rule_ids(&frosted), vec![RuleId::OnlyTempered]);
        assert!(rule_ids(&frosted.tempered(true)).is_empty());
    }

    #[test]
    fn test_input_sanity_rules() {
        let request = QuoteRequest::new(
            Shape::Rectangular { width_in: dec!(0), height_in: dec!(-2) },
            Material::Clear,
            QUARTER,
        )
        .quantity(0);
        assert_eq!(
            rule_ids(&request),
            vec![RuleId::DimensionsPositive, RuleId::QuantityRange]
        );

        let huge = QuoteRequest::new(
            Shape::Circular { diameter_in: MAX_DIMENSION_IN + dec!(0.01) },
            Material::Clear,
            QUARTER,
        );
        assert_eq!(rule_ids(&huge), vec![RuleId::DimensionsInRange]);

        let largest = QuoteRequest::new(
            Shape::Rectangular { width_in: MAX_DIMENSION_IN, height_in: MAX_DIMENSION_IN },
            Material::Clear,
            QUARTER,
        );
        assert!(rule_ids(&largest).is_empty());

        let mut corners = QuoteRequest::new(rect(), Material::Clear, QUARTER);
        corners.corner_count = 5;
        assert_eq!(
            rule_ids(&corners),
            vec![RuleId::CornerCountRange, RuleId::ClipSizeRequired]
        );
    }

    #[test]
    fn test_rule_id_serialization() {
        let json = serde_json::to_string(&RuleId::MirrorClippedCorners).unwrap();
        assert_eq!(json, "\"mirror_clipped_corners\"");
        assert_eq!(RuleId::ThinGlassTemper.to_string(), "thin_glass_temper");
    }

    #[test]
    fn test_rule_table_ids_unique() {
        let mut ids: Vec<RuleId> = RULES.iter().map(|r| r.id).collect();
        let before = ids.len();
        ids.sort_by_key(|id| id.as_str());
        ids.dedup();
        assert_eq!(ids.len(), before);
    }
}
