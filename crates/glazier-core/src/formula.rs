//! # Formula Evaluator
//!
//! Converts the quantity-extended total into the customer price.
//!
//! ## Formula Versions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    FormulaConfiguration lifecycle                       │
//! │                                                                         │
//! │   Draft ──activate──► Active ──(next activation)──► Archived           │
//! │                          ▲                              │               │
//! │                          └──── restore (as NEW version) ┘               │
//! │                                                                         │
//! │  • exactly one Active version at a time                                │
//! │  • versions are never edited once active; edits append a new version   │
//! │  • the store runs activate + archive in one transaction                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculation only needs the conversion, the component toggles and the
//! version number; that subset is [`PricingFormula`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::FormulaError;
use crate::expression::Expression;
use crate::money::Money;

// =============================================================================
// Mode and Status
// =============================================================================

/// How the total becomes a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FormulaMode {
    Divisor,
    Multiplier,
    Custom,
}

impl FormulaMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FormulaMode::Divisor => "divisor",
            FormulaMode::Multiplier => "multiplier",
            FormulaMode::Custom => "custom",
        }
    }
}

impl fmt::Display for FormulaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a formula version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FormulaStatus {
    /// Saved and validated, not yet in effect.
    #[default]
    Draft,
    /// The single formula every calculation uses.
    Active,
    /// Superseded. Kept for audit; never edited.
    Archived,
}

// =============================================================================
// Price Conversion
// =============================================================================

/// The conversion rule, carrying only the value its mode uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PriceConversion {
    /// `quote = total / value` (e.g. 0.28 for a 72% margin)
    Divisor {
        #[ts(type = "string")]
        value: Decimal,
    },
    /// `quote = total * value`
    Multiplier {
        #[ts(type = "string")]
        value: Decimal,
    },
    /// `quote = expression(total)`
    Custom { expression: String },
}

impl PriceConversion {
    pub fn mode(&self) -> FormulaMode {
        match self {
            PriceConversion::Divisor { .. } => FormulaMode::Divisor,
            PriceConversion::Multiplier { .. } => FormulaMode::Multiplier,
            PriceConversion::Custom { .. } => FormulaMode::Custom,
        }
    }

    /// Checks the conversion can be evaluated.
    ///
    /// Called before a version is saved and again before every evaluation.
    pub fn validate(&self) -> Result<(), FormulaError> {
        match self {
            PriceConversion::Divisor { value } => {
                if value.is_zero() {
                    return Err(FormulaError::ZeroDivisor);
                }
                check_factor(FormulaMode::Divisor, *value)
            }
            PriceConversion::Multiplier { value } => check_factor(FormulaMode::Multiplier, *value),
            PriceConversion::Custom { expression } => Expression::parse(expression).map(|_| ()),
        }
    }

    /// Applies the conversion to a total. No rounding.
    pub fn apply(&self, total: Decimal) -> Result<Decimal, FormulaError> {
        self.validate()?;
        match self {
            PriceConversion::Divisor { value } => total.checked_div(*value).ok_or(FormulaError::Overflow),
            PriceConversion::Multiplier { value } => total.checked_mul(*value).ok_or(FormulaError::Overflow),
            PriceConversion::Custom { expression } => Expression::parse(expression)?.evaluate(total),
        }
    }
}

fn check_factor(mode: FormulaMode, value: Decimal) -> Result<(), FormulaError> {
    if value <= Decimal::ZERO {
        return Err(FormulaError::InvalidValue {
            mode: mode.to_string(),
            value,
        });
    }
    Ok(())
}

// =============================================================================
// Component Toggles
// =============================================================================

/// A cost component an administrator can switch off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Base,
    Polish,
    Beveled,
    ClippedCorners,
    TemperedMarkup,
    ShapeMarkup,
    ContractorDiscount,
}

impl Component {
    pub const ALL: [Component; 7] = [
        Component::Base,
        Component::Polish,
        Component::Beveled,
        Component::ClippedCorners,
        Component::TemperedMarkup,
        Component::ShapeMarkup,
        Component::ContractorDiscount,
    ];
}

/// Per-component enable flags. A disabled component contributes zero no
/// matter what the customer selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComponentToggles {
    pub base: bool,
    pub polish: bool,
    pub beveled: bool,
    pub clipped_corners: bool,
    pub tempered_markup: bool,
    pub shape_markup: bool,
    pub contractor_discount: bool,
}

impl ComponentToggles {
    /// Every component enabled.
    pub const fn all_enabled() -> Self {
        ComponentToggles {
            base: true,
            polish: true,
            beveled: true,
            clipped_corners: true,
            tempered_markup: true,
            shape_markup: true,
            contractor_discount: true,
        }
    }

    pub fn is_enabled(&self, component: Component) -> bool {
        match component {
            Component::Base => self.base,
            Component::Polish => self.polish,
            Component::Beveled => self.beveled,
            Component::ClippedCorners => self.clipped_corners,
            Component::TemperedMarkup => self.tempered_markup,
            Component::ShapeMarkup => self.shape_markup,
            Component::ContractorDiscount => self.contractor_discount,
        }
    }

    /// Returns a copy with one component switched.
    pub fn with(mut self, component: Component, enabled: bool) -> Self {
        let flag = match component {
            Component::Base => &mut self.base,
            Component::Polish => &mut self.polish,
            Component::Beveled => &mut self.beveled,
            Component::ClippedCorners => &mut self.clipped_corners,
            Component::TemperedMarkup => &mut self.tempered_markup,
            Component::ShapeMarkup => &mut self.shape_markup,
            Component::ContractorDiscount => &mut self.contractor_discount,
        };
        *flag = enabled;
        self
    }
}

impl Default for ComponentToggles {
    fn default() -> Self {
        ComponentToggles::all_enabled()
    }
}

// =============================================================================
// Formula Records
// =============================================================================

/// What an administrator submits when saving a formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FormulaDraft {
    pub conversion: PriceConversion,
    #[serde(default)]
    pub components: ComponentToggles,
    #[serde(default)]
    pub description: Option<String>,
}

impl FormulaDraft {
    pub fn new(conversion: PriceConversion) -> Self {
        FormulaDraft {
            conversion,
            components: ComponentToggles::all_enabled(),
            description: None,
        }
    }

    pub fn components(mut self, components: ComponentToggles) -> Self {
        self.components = components;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), FormulaError> {
        self.conversion.validate()
    }
}

/// A stored formula version with its audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FormulaConfiguration {
    #[ts(as = "String")]
    pub id: Uuid,
    /// Monotonic version number, 1-based.
    pub version: i64,
    pub status: FormulaStatus,
    pub conversion: PriceConversion,
    pub components: ComponentToggles,
    pub description: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Who put this version into effect.
    pub activated_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub activated_at: Option<DateTime<Utc>>,
    /// Whose activation superseded this version.
    pub archived_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl FormulaConfiguration {
    pub fn mode(&self) -> FormulaMode {
        self.conversion.mode()
    }

    pub fn is_active(&self) -> bool {
        self.status == FormulaStatus::Active
    }

    /// The subset a calculation needs.
    pub fn pricing_formula(&self) -> PricingFormula {
        PricingFormula {
            version: self.version,
            conversion: self.conversion.clone(),
            components: self.components,
        }
    }
}

/// The formula as the pipeline sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingFormula {
    pub version: i64,
    pub conversion: PriceConversion,
    pub components: ComponentToggles,
}

impl PricingFormula {
    /// An unversioned formula with every component enabled.
    pub fn new(conversion: PriceConversion) -> Self {
        PricingFormula {
            version: 0,
            conversion,
            components: ComponentToggles::all_enabled(),
        }
    }

    pub fn components(mut self, components: ComponentToggles) -> Self {
        self.components = components;
        self
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Converts a total into the final price, rounded to the cent.
///
/// This is the only place in the pipeline that rounds.
///
/// ## Example
/// ```rust
/// use glazier_core::formula::{convert_to_quote, PriceConversion, PricingFormula};
/// use rust_decimal::Decimal;
///
/// let formula = PricingFormula::new(PriceConversion::Divisor { value: Decimal::new(28, 2) });
/// let quote = convert_to_quote(Decimal::new(23895, 2), &formula).unwrap();
/// assert_eq!(quote.to_string(), "$853.39");
/// ```
pub fn convert_to_quote(total: Decimal, formula: &PricingFormula) -> Result<Money, FormulaError> {
    let raw = formula.conversion.apply(total)?;

    if raw < Decimal::ZERO {
        return Err(FormulaError::NegativePrice { value: raw });
    }

    Money::from_decimal_rounded(raw).ok_or(FormulaError::Overflow)
}

// =============================================================================
// Unit Tests
// =============================================================================
