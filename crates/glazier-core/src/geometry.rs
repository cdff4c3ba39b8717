//! # Geometry Resolver
//!
//! Billable area and perimeter for a shape.
//!
//! ```text
//!   Rectangular / Irregular          Circular
//!   ┌──────── w ────────┐              ╭───╮
//!   │                   │ h           │  d  │
//!   └───────────────────┘              ╰───╯
//!   area  = w·h / 144 sqft          area  = π(d/2)² / 144 sqft
//!   perim = 2(w + h) in             perim = π·d in
//! ```
//!
//! Irregular cuts are priced on their bounding box. Nothing is rounded here,
//! and every figure is an exact `Decimal` except the circle's π.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Shape;

pub const SQ_INCHES_PER_SQ_FOOT: Decimal = Decimal::from_parts(144, 0, 0, false, 0);

/// Resolved measurements for one piece.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Geometry {
    #[ts(type = "string")]
    pub actual_area_sqft: Decimal,
    /// `max(actual, minimum_billable_area)`
    #[ts(type = "string")]
    pub billable_area_sqft: Decimal,
    #[ts(type = "string")]
    pub perimeter_in: Decimal,
    /// True when the minimum billable area was charged instead of the actual.
    pub minimum_applied: bool,
}

/// Computes the area and perimeter of a shape, then applies the billing floor.
///
/// Dimensions must already be within [`MAX_DIMENSION_IN`](crate::MAX_DIMENSION_IN);
/// `calculate_quote` validates before it gets here.
///
/// ## Example
/// ```rust
/// use glazier_core::geometry::resolve;
/// use glazier_core::types::Shape;
/// use rust_decimal::Decimal;
///
/// let twelve = Decimal::from(12);
/// let g = resolve(&Shape::Rectangular { width_in: twelve, height_in: twelve }, Decimal::from(3));
/// assert_eq!(g.actual_area_sqft, Decimal::ONE);
/// assert_eq!(g.billable_area_sqft, Decimal::from(3));
/// assert!(g.minimum_applied);
/// ```
pub fn resolve(shape: &Shape, minimum_billable_area: Decimal) -> Geometry {
    let (area_sq_in, perimeter_in) = match *shape {
        Shape::Rectangular { width_in, height_in } | Shape::Irregular { width_in, height_in } => {
            (width_in * height_in, Decimal::TWO * (width_in + height_in))
        }
        Shape::Circular { diameter_in } => {
            let radius = diameter_in / Decimal::TWO;
            (Decimal::PI * radius * radius, Decimal::PI * diameter_in)
        }
    };

    let actual_area_sqft = area_sq_in / SQ_INCHES_PER_SQ_FOOT;
    let (billable_area_sqft, minimum_applied) = apply_minimum(actual_area_sqft, minimum_billable_area);

    Geometry {
        actual_area_sqft,
        billable_area_sqft,
        perimeter_in,
        minimum_applied,
    }
}

/// Raises an area to the billing floor. Returns the area and whether the
/// floor was used.
pub fn apply_minimum(area_sqft: Decimal, minimum_billable_area: Decimal) -> (Decimal, bool) {
    if area_sqft < minimum_billable_area {
        (minimum_billable_area, true)
    } else {
        (area_sqft, false)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rect(width_in: Decimal, height_in: Decimal) -> Shape {
        Shape::Rectangular { width_in, height_in }
    }

    #[test]
    fn test_rectangle() {
        let g = resolve(&rect(dec!(24), dec!(36)), dec!(3));
        assert_eq!(g.actual_area_sqft, dec!(6));
        assert_eq!(g.billable_area_sqft, dec!(6));
        assert_eq!(g.perimeter_in, dec!(120));
        assert!(!g.minimum_applied);
    }

    #[test]
    fn test_fractional_inches_are_exact() {
        let g = resolve(&rect(dec!(23.875), dec!(36.125)), dec!(3));
        assert_eq!(g.perimeter_in, dec!(120));
        assert_eq!(g.actual_area_sqft * SQ_INCHES_PER_SQ_FOOT, dec!(862.484375));
    }

    #[test]
    fn test_irregular_uses_bounding_box() {
        let rect = resolve(&rect(dec!(18), dec!(30)), dec!(3));
        let irregular = resolve(&Shape::Irregular { width_in: dec!(18), height_in: dec!(30) }, dec!(3));
        assert_eq!(rect, irregular);
    }

    #[test]
    fn test_circle() {
        let g = resolve(&Shape::Circular { diameter_in: dec!(30) }, dec!(3));
        assert!((g.actual_area_sqft - dec!(4.9087)).abs() < dec!(0.0001));
        assert!((g.perimeter_in - dec!(94.2478)).abs() < dec!(0.0001));
        assert!(!g.minimum_applied);
    }

    #[test]
    fn test_minimum_area_floor() {
        let g = resolve(&rect(dec!(12), dec!(12)), dec!(3));
        assert_eq!(g.actual_area_sqft, dec!(1));
        assert_eq!(g.billable_area_sqft, dec!(3));
        assert!(g.minimum_applied);
    }

    #[test]
    fn test_minimum_is_idempotent() {
        for area in [dec!(0.25), dec!(1.0), dec!(2.999), dec!(3.0), dec!(4.5), dec!(120.0)] {
            let (once, _) = apply_minimum(area, dec!(3));
            let (twice, applied_again) = apply_minimum(once, dec!(3));
            assert_eq!(once, twice);
            assert!(!applied_again);
            assert!(once >= dec!(3));
        }
    }

    #[test]
    fn test_exact_minimum_not_flagged() {
        let g = resolve(&rect(dec!(18), dec!(24)), dec!(3));
        assert_eq!(g.actual_area_sqft, dec!(3));
        assert!(!g.minimum_applied);
    }
}
