//! # glazier-db: Configuration Store
//!
//! Persists the price book and the formula version log in SQLite, and
//! serves fresh snapshots to the quote path.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Glazier Data Flow                                │
//! │                                                                         │
//! │  Web layer (quote form, admin screens)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   glazier-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌───────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations   │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)   │  │   │
//! │  │   │               │    │ PricingRepo    │   │               │  │   │
//! │  │   │ SqlitePool    │◄───│ EdgeRateRepo   │   │ 001_pricing_  │  │   │
//! │  │   │ QuoteService  │    │ ConstantsRepo  │   │   schema.sql  │  │   │
//! │  │   │               │    │ FormulaRepo    │   │               │  │   │
//! │  │   └───────┬───────┘    └────────────────┘   └───────────────┘  │   │
//! │  │           │ load_snapshot                                       │   │
//! │  │           ▼                                                     │   │
//! │  │   glazier_core::calculate_quote (pure)                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ./glazier.db  (GLAZIER_DATABASE_PATH)                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded schema, constraints and history triggers
//! - [`error`] - Database error types
//! - [`repository`] - Price book and formula repositories
//! - [`snapshot`] - Consistent read of the whole configuration
//! - [`quote`] - Quote service over the live store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use glazier_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! // Admin edit: takes effect on the next quote
//! db.formulas().save_and_activate(&draft, "owner@shop").await?;
//!
//! // Quote
//! let outcome = db.quotes().quote(&request).await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod quote;
pub mod repository;
pub mod snapshot;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{ConfigError, Database, DbConfig};
pub use quote::QuoteService;
pub use snapshot::load_snapshot;

// Repository re-exports for convenience
pub use repository::constants::ConstantsRepository;
pub use repository::edge_rate::EdgeRateRepository;
pub use repository::formula::FormulaRepository;
pub use repository::pricing::PricingRepository;
pub use repository::Audited;
