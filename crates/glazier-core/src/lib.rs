//! # glazier-core: Pure Pricing Logic for Glazier
//!
//! This crate is the **heart** of the Glazier quotation engine. It turns a
//! glass order into a price using only the configuration it is handed, with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Glazier Quotation Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    CRM front end (React)                        │   │
//! │  │    Quotation form ──► price breakdown ──► admin formula editor │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              glazier-db (Configuration Store)                   │   │
//! │  │    QuoteService: load fresh snapshot ──► calculate_quote        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ glazier-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────┐ │   │
//! │  │   │validation│►│ geometry │►│  costs   │►│  markup  │►│formula│ │   │
//! │  │   │  RULES   │ │area/perim│ │components│ │ discount │ │ expr  │ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘ └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Thickness, Material, Shape, QuoteRequest
//! - [`config`] - Price book rows and the per-calculation [`ConfigSnapshot`]
//! - [`validation`] - Declarative rule table
//! - [`geometry`] - Area, perimeter, minimum billable area
//! - [`costs`] - Per-component costs
//! - [`markup`] - Markups, contractor discount, quantity
//! - [`formula`] - Formula versions and price conversion
//! - [`expression`] - Sandboxed arithmetic for custom formulas
//! - [`quote`] - The pipeline and its serializable outcome
//! - [`money`] - Final price in integer cents
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same request + same snapshot = same quote
//! 2. **No I/O**: the caller loads the snapshot; this crate never does
//! 3. **Round Once**: dollars are exact decimals until the formula's output
//! 4. **Explicit Errors**: every failure is a typed error, never a panic
//!
//! ## Example Usage
//!
//! ```rust
//! use glazier_core::config::{ConfigSnapshot, PricingEntry, SystemConstants};
//! use glazier_core::formula::{PriceConversion, PricingFormula};
//! use glazier_core::{calculate_quote, Material, QuoteRequest, Shape, Thickness};
//! use rust_decimal::Decimal;
//!
//! let eighth = Thickness::from_sixteenths(2);
//! let quarter = Thickness::from_sixteenths(4);
//! // 1/8" must be stocked, otherwise 1/4" is the thinnest glass and cannot be
//! // polished or tempered.
//! let snapshot = ConfigSnapshot::new(
//!     vec![
//!         PricingEntry::new(eighth, Material::Clear, Decimal::new(800, 2), Decimal::new(60, 2)),
//!         PricingEntry::new(quarter, Material::Clear, Decimal::new(1250, 2), Decimal::new(85, 2)),
//!     ],
//!     vec![],
//!     vec![],
//!     SystemConstants {
//!         minimum_billable_area: Decimal::new(30, 1),
//!         contractor_discount_rate: Decimal::new(10, 2),
//!         flat_polish_rate: Decimal::new(27, 2),
//!         tempered_markup_rate: Decimal::new(35, 2),
//!         shape_markup_rate: Decimal::new(25, 2),
//!     },
//!     PricingFormula::new(PriceConversion::Divisor { value: Decimal::new(28, 2) }),
//! )
//! .unwrap();
//!
//! let request = QuoteRequest::new(
//!     Shape::Rectangular { width_in: Decimal::from(24), height_in: Decimal::from(36) },
//!     Material::Clear,
//!     quarter,
//! )
//! .polished(true)
//! .tempered(true);
//!
//! let result = calculate_quote(&request, &snapshot).unwrap();
//! assert_eq!(result.quote_price.to_string(), "$853.39");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod costs;
pub mod error;
pub mod expression;
pub mod formula;
pub mod geometry;
pub mod markup;
pub mod money;
pub mod quote;
pub mod types;
pub mod validation;

use rust_decimal::Decimal;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use glazier_core::Money` instead of
// `use glazier_core::money::Money`

pub use config::ConfigSnapshot;
pub use error::{ConfigurationError, FormulaError, QuoteError, RuleViolation, ValidationError};
pub use money::Money;
pub use quote::{calculate_quote, QuoteOutcome, QuoteResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest accepted dimension (width, height or diameter), in inches.
pub const MAX_DIMENSION_IN: Decimal = Decimal::from_parts(1200, 0, 0, false, 0);

/// Maximum number of clipped corners on one piece.
pub const MAX_CLIPPED_CORNERS: u32 = 4;

/// Maximum pieces on one quote line
///
/// ## Business Reason
/// Catches typos (1000 instead of 10) before they reach a customer.
pub const MAX_QUANTITY: u32 = 999;
