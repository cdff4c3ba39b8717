//! # Seed Price Book
//!
//! Loads a baseline price book and the first pricing formula, for
//! development and demos.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by GLAZIER_DATABASE_PATH (default ./glazier.db)
//! cargo run -p glazier-db --bin seed
//!
//! # Specify database path
//! cargo run -p glazier-db --bin seed -- --db ./data/glazier.db
//! ```
//!
//! ## What Gets Written
//! - Pricing rows for clear, low-iron, tinted, frosted and mirror glass
//! - Beveled rates per thickness and clipped-corner rates per size tier
//! - Shop constants (3 sq ft minimum, 10% contractor discount, ...)
//! - Formula version 1: divide by 0.28, every component enabled
//!
//! A database that already has a formula is left alone.

use std::env;

use glazier_core::config::{BeveledRate, ClipRate, PricingEntry, SizeTier, SystemConstants};
use glazier_core::formula::{FormulaDraft, PriceConversion};
use glazier_core::types::{Material, Thickness};
use glazier_db::{Database, DbConfig};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ACTOR: &str = "seed";

const EIGHTH: Thickness = Thickness::from_sixteenths(2);
const THREE_SIXTEENTHS: Thickness = Thickness::from_sixteenths(3);
const QUARTER: Thickness = Thickness::from_sixteenths(4);
const THREE_EIGHTHS: Thickness = Thickness::from_sixteenths(6);
const HALF: Thickness = Thickness::from_sixteenths(8);

/// Schedule amounts are written in cents (or hundredths of a rate).
fn hundredths(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

/// (thickness, base $/sq ft, polish $/inch, bevel $/inch, clip under 1", clip 1" and over)
const CLEAR_SCHEDULE: &[(Thickness, i64, i64, i64, i64, i64)] = &[
    (EIGHTH, 800, 60, 90, 300, 450),
    (THREE_SIXTEENTHS, 1025, 72, 100, 350, 525),
    (QUARTER, 1250, 85, 110, 400, 600),
    (THREE_EIGHTHS, 1875, 105, 140, 500, 750),
    (HALF, 2400, 130, 175, 600, 900),
];

fn pricing_entries() -> Vec<PricingEntry> {
    let entry = |thickness, material, base, polish| {
        PricingEntry::new(thickness, material, hundredths(base), hundredths(polish))
    };

    let mut entries: Vec<PricingEntry> = CLEAR_SCHEDULE
        .iter()
        .map(|&(thickness, base, polish, ..)| entry(thickness, Material::Clear, base, polish))
        .collect();

    for &(thickness, base, polish) in &[(QUARTER, 1600, 90), (THREE_EIGHTHS, 2350, 110), (HALF, 3000, 135)] {
        entries.push(entry(thickness, Material::LowIron, base, polish).never_tempered(true));
    }
    for &(thickness, base, polish) in &[(THREE_SIXTEENTHS, 1200, 75), (QUARTER, 1425, 88)] {
        entries.push(entry(thickness, Material::Tinted, base, polish));
    }
    entries.push(entry(QUARTER, Material::Frosted, 1750, 95).only_tempered(true));
    entries.push(entry(QUARTER, Material::Mirror, 1500, 0).flat_polish(true));

    entries
}

fn constants() -> SystemConstants {
    SystemConstants {
        minimum_billable_area: hundredths(300),
        contractor_discount_rate: hundredths(10),
        flat_polish_rate: hundredths(27),
        tempered_markup_rate: hundredths(35),
        shape_markup_rate: hundredths(25),
    }
}

fn print_help() {
    println!("Glazier Seed Price Book");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>    Database file path (default: $GLAZIER_DATABASE_PATH or ./glazier.db)");
    println!("  -h, --help         Show this help message");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,glazier_db=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = match db_path {
        Some(path) => DbConfig::new(path),
        None => DbConfig::from_env()?,
    };
    let db = Database::new(config).await?;

    if !db.formulas().history().await?.is_empty() {
        println!("⚠ Database already has a pricing formula");
        println!("  Skipping seed so live prices are not overwritten.");
        return Ok(());
    }

    let entries = pricing_entries();
    for entry in &entries {
        db.pricing().upsert(entry, ACTOR).await?;
    }

    for &(thickness, _, _, bevel, under, over) in CLEAR_SCHEDULE {
        db.edge_rates()
            .upsert_beveled(&BeveledRate { thickness, rate_per_inch: hundredths(bevel) }, ACTOR)
            .await?;
        for (tier, rate_per_corner) in [(SizeTier::UnderOneInch, under), (SizeTier::OneInchOrOver, over)] {
            db.edge_rates()
                .upsert_clip(&ClipRate { thickness, tier, rate_per_corner: hundredths(rate_per_corner) }, ACTOR)
                .await?;
        }
    }

    db.constants().set(&constants(), ACTOR).await?;

    let draft = FormulaDraft::new(PriceConversion::Divisor { value: hundredths(28) }).description("Initial price book");
    let formula = db.formulas().save_and_activate(&draft, ACTOR).await?;

    info!(
        pricing_entries = entries.len(),
        edge_thicknesses = CLEAR_SCHEDULE.len(),
        formula_version = formula.version,
        "Seed complete"
    );
    println!("✓ Seed complete: formula v{} is active", formula.version);

    Ok(())
}
