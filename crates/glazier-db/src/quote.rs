//! # Quote Service
//!
//! Loads a fresh snapshot and runs the pricing pipeline.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  QuoteService::quote(&request)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  snapshot::load_snapshot ── Err ──► configuration_error                 │
//! │       │                             ("Pricing unavailable ...")         │
//! │       ▼                                                                 │
//! │  glazier_core::calculate_quote                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  QuoteOutcome (success | validation_error | configuration_error |      │
//! │                formula_error)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No snapshot is cached: an admin edit applies to the very next quote.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::snapshot::load_snapshot;
use glazier_core::error::QuoteError;
use glazier_core::quote::{calculate_quote, QuoteOutcome};
use glazier_core::types::QuoteRequest;

/// Prices requests against the live Configuration Store.
#[derive(Debug, Clone)]
pub struct QuoteService {
    pool: SqlitePool,
}

impl QuoteService {
    /// Creates a new QuoteService.
    pub fn new(pool: SqlitePool) -> Self {
        QuoteService { pool }
    }

    /// Prices one request. Every failure is folded into the outcome.
    pub async fn quote(&self, request: &QuoteRequest) -> QuoteOutcome {
        debug!(
            material = %request.material,
            thickness = %request.thickness,
            quantity = request.quantity,
            "Quote requested"
        );

        let result = match load_snapshot(&self.pool).await {
            Ok(snapshot) => calculate_quote(request, &snapshot),
            Err(err) => Err(QuoteError::Configuration(err)),
        };

        match &result {
            Ok(quote) => info!(
                quote_price = %quote.quote_price,
                formula_version = quote.formula_version,
                minimum_applied = quote.geometry.minimum_applied,
                "Quote calculated"
            ),
            Err(QuoteError::Validation(err)) => {
                debug!(violations = err.violations.len(), "Quote rejected by pricing rules")
            }
            Err(err) => warn!(error = %err, "Quote failed"),
        }

        QuoteOutcome::from(result)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
