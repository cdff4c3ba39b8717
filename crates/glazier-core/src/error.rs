//! # Error Types
//!
//! Domain-specific error types for glazier-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  glazier-core errors (this file)                                       │
//! │  ├── QuoteError          - What a calculation can fail with            │
//! │  │   ├── ValidationError    - Violated business rules (user fixable)  │
//! │  │   ├── ConfigurationError - Missing/invalid price book rows         │
//! │  │   └── FormulaError       - Unusable price conversion               │
//! │  └── ParseThicknessError - Bad thickness label                         │
//! │                                                                         │
//! │  glazier-db errors (separate crate)                                    │
//! │  └── DbError             - Configuration Store failures                │
//! │                                                                         │
//! │  Flow: QuoteError → QuoteOutcome (tagged, serialized) → Web layer      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (thickness, material, position)
//! 3. Validation collects every violation, never only the first

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::config::SizeTier;
use crate::types::{Material, Thickness};
use crate::validation::RuleId;

// =============================================================================
// Quote Error
// =============================================================================

/// Everything a quote calculation can fail with.
///
/// Callers branch on the variant; none of them is retried because the
/// pipeline is deterministic.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The request breaks one or more business rules.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The price book has no row for the requested combination.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The active formula cannot produce a price.
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single violated rule, shaped for the quotation form.
///
/// `field` names the form control the UI should highlight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RuleViolation {
    pub rule: RuleId,
    pub field: String,
    pub message: String,
}

/// The request violates business rules.
///
/// ## User Workflow
/// ```text
/// Quote form: 1/8" mirror, tempered, 2 clipped corners
///      │
///      ▼
/// validate_request() ← collects ALL violations
///      │
///      ▼
/// ValidationError { violations: [thin_glass_temper, thin_glass_mirror,
///                                mirror_temper, mirror_clipped_corners] }
///      │
///      ▼
/// UI flags every offending control at once
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request violates {} pricing rule(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<RuleViolation>,
}

impl ValidationError {
    /// Returns true if the given rule is among the violations.
    pub fn contains(&self, rule: RuleId) -> bool {
        self.violations.iter().any(|v| v.rule == rule)
    }
}

// =============================================================================
// Configuration Error
// =============================================================================

/// The configuration snapshot cannot price the request.
///
/// These are server-side misconfigurations, distinct from user error. The web
/// layer shows "pricing unavailable for this combination".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("no pricing entry for {thickness} {material}")]
    MissingPricingEntry {
        thickness: Thickness,
        material: Material,
    },

    #[error("no beveled edge rate for {thickness}")]
    MissingBeveledRate { thickness: Thickness },

    #[error("no clipped corner rate for {thickness} ({tier})")]
    MissingClipRate { thickness: Thickness, tier: SizeTier },

    #[error("duplicate pricing entry for {thickness} {material}")]
    DuplicatePricingEntry {
        thickness: Thickness,
        material: Material,
    },

    #[error("duplicate beveled edge rate for {thickness}")]
    DuplicateBeveledRate { thickness: Thickness },

    #[error("duplicate clipped corner rate for {thickness} ({tier})")]
    DuplicateClipRate { thickness: Thickness, tier: SizeTier },

    /// A pricing entry is flagged both `only_tempered` and `never_tempered`.
    #[error("{thickness} {material} cannot be both only-tempered and never-tempered")]
    ConflictingTemperFlags {
        thickness: Thickness,
        material: Material,
    },

    #[error("{field} must be between 0 and 1000000 (got {value})")]
    InvalidPrice { field: String, value: Decimal },

    #[error("{name} is out of range (got {value})")]
    InvalidConstant { name: String, value: Decimal },

    #[error("no active pricing formula")]
    NoActiveFormula,

    #[error("system constants have not been configured")]
    MissingSystemConstants,

    /// The Configuration Store could not produce a snapshot. The payload is
    /// shown to the caller, so it never carries driver text.
    #[error("configuration store unavailable: {0}")]
    StoreUnavailable(String),
}

// =============================================================================
// Formula Error
// =============================================================================

/// The price conversion formula is unusable.
///
/// Raised when a formula is saved (so it never becomes active) and again at
/// every evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("divisor must not be zero")]
    ZeroDivisor,

    #[error("{mode} value must be a positive number (got {value})")]
    InvalidValue { mode: String, value: Decimal },

    #[error("custom expression is empty")]
    EmptyExpression,

    #[error("custom expression exceeds {max} characters")]
    ExpressionTooLong { max: usize },

    #[error("custom expression nests deeper than {max} levels")]
    ExpressionTooDeep { max: usize },

    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("unknown identifier '{name}' at position {position}; only `total` is allowed")]
    UnknownIdentifier { name: String, position: usize },

    #[error("invalid number '{literal}' at position {position}")]
    InvalidNumber { literal: String, position: usize },

    #[error("unexpected '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("custom expression ends unexpectedly")]
    UnexpectedEnd,

    /// Constant expressions such as `42` are rejected.
    #[error("custom expression must reference `total`")]
    MissingTotal,

    #[error("division by zero while evaluating the formula")]
    DivisionByZero,

    #[error("formula result is out of range")]
    Overflow,

    #[error("formula produced a negative price ({value})")]
    NegativePrice { value: Decimal },
}

// =============================================================================
// Thickness Parse Error
// =============================================================================

/// A thickness label could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid thickness '{input}': {reason}")]
pub struct ParseThicknessError {
    pub input: String,
    pub reason: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
