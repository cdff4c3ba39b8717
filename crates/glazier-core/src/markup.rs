//! # Markup & Discount Engine
//!
//! Percentage adjustments on the pre-markup subtotal, then quantity.
//!
//! ```text
//! pre ──► + tempered (pre × rate) ──► + shape (pre × rate) ──► post
//! post ─► − contractor (post × rate) ──► discounted ──► × quantity ──► total
//! ```
//!
//! Both markups are taken on `pre`, not compounded on each other.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::SystemConstants;
use crate::formula::ComponentToggles;
use crate::types::QuoteRequest;

/// Markups, discount, and the subtotals between them. Dollars, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Adjustments {
    #[ts(type = "string")]
    pub tempered_markup: Decimal,
    #[ts(type = "string")]
    pub shape_markup: Decimal,
    #[ts(type = "string")]
    pub post_markup_subtotal: Decimal,
    #[ts(type = "string")]
    pub contractor_discount: Decimal,
    #[ts(type = "string")]
    pub discounted_subtotal: Decimal,
    /// `discounted_subtotal × quantity`
    #[ts(type = "string")]
    pub total: Decimal,
}

/// Applies markups and the contractor discount, then extends by quantity.
pub fn apply(
    pre_markup_subtotal: Decimal,
    request: &QuoteRequest,
    constants: &SystemConstants,
    toggles: &ComponentToggles,
) -> Adjustments {
    let pre = pre_markup_subtotal;

    let tempered_markup = if request.tempered && toggles.tempered_markup {
        pre * constants.tempered_markup_rate
    } else {
        Decimal::ZERO
    };

    let shape_markup = if !request.shape.is_rectangular() && toggles.shape_markup {
        pre * constants.shape_markup_rate
    } else {
        Decimal::ZERO
    };

    let post_markup_subtotal = pre + tempered_markup + shape_markup;

    let contractor_discount = if request.contractor && toggles.contractor_discount {
        post_markup_subtotal * constants.contractor_discount_rate
    } else {
        Decimal::ZERO
    };

    let discounted_subtotal = post_markup_subtotal - contractor_discount;

    Adjustments {
        tempered_markup,
        shape_markup,
        post_markup_subtotal,
        contractor_discount,
        discounted_subtotal,
        total: discounted_subtotal * Decimal::from(request.quantity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Component;
    use crate::types::{Material, Shape, Thickness};
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

    fn request(shape: Shape) -> QuoteRequest {
        QuoteRequest::new(shape, Material::Clear, Thickness::from_sixteenths(4))
    }

    const RECT: Shape = Shape::Rectangular { width_in: dec!(24), height_in: dec!(36) };
    const CIRCLE: Shape = Shape::Circular { diameter_in: dec!(30) };

    #[test]
    fn test_tempered_markup() {
        let adj = apply(dec!(177), &request(RECT).tempered(true), &constants(), &ComponentToggles::default());
        assert_eq!(adj.tempered_markup, dec!(61.95));
        assert_eq!(adj.shape_markup, Decimal::ZERO);
        assert_eq!(adj.total, dec!(238.95));
    }

    #[test]
    fn test_markups_are_not_compounded() {
        let adj = apply(dec!(100), &request(CIRCLE).tempered(true), &constants(), &ComponentToggles::default());
        assert_eq!(adj.tempered_markup, dec!(35));
        assert_eq!(adj.shape_markup, dec!(25));
        assert_eq!(adj.post_markup_subtotal, dec!(160));
    }

    #[test]
    fn test_contractor_discount_after_markups() {
        let req = request(CIRCLE).contractor(true);
        let adj = apply(dec!(100), &req, &constants(), &ComponentToggles::default());
        assert_eq!(adj.contractor_discount, dec!(12.5));
        assert_eq!(adj.discounted_subtotal, dec!(112.5));
    }

    #[test]
    fn test_quantity_extends_total() {
        let adj = apply(dec!(50), &request(RECT).quantity(4), &constants(), &ComponentToggles::default());
        assert_eq!(adj.discounted_subtotal, dec!(50));
        assert_eq!(adj.total, dec!(200));
    }

    #[test]
    fn test_disabled_markups() {
        let req = request(Shape::Irregular { width_in: dec!(10), height_in: dec!(10) })
            .tempered(true)
            .contractor(true);
        let toggles = ComponentToggles::default()
            .with(Component::TemperedMarkup, false)
            .with(Component::ContractorDiscount, false);
        let adj = apply(dec!(100), &req, &constants(), &toggles);

        assert_eq!(adj.tempered_markup, Decimal::ZERO);
        assert_eq!(adj.contractor_discount, Decimal::ZERO);
        assert_eq!(adj.shape_markup, dec!(25));
    }
}
