//! # Quote CLI
//!
//! Prices one request against the Configuration Store and prints the
//! outcome as JSON.
//!
//! ## Usage
//! ```bash
//! # From a file
//! cargo run -p glazier-db --bin quote -- request.json
//!
//! # From stdin
//! echo '{"shape":{"kind":"rectangular","width_in":24,"height_in":36},
//!        "material":"clear","thickness":"1/4","polish":true}' \
//!   | cargo run -p glazier-db --bin quote
//! ```
//!
//! Exits non-zero only when the request cannot be read or the database
//! cannot be opened. Pricing failures are part of the printed outcome.

use std::env;
use std::fs;
use std::io::{self, Read};

use glazier_core::types::QuoteRequest;
use glazier_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,glazier_db=info,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let raw = match env::args().nth(1) {
        Some(path) if path == "--help" || path == "-h" => {
            println!("Usage: quote [REQUEST_JSON_FILE]   (reads stdin when omitted)");
            return Ok(());
        }
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let request: QuoteRequest = serde_json::from_str(&raw)?;

    let db = Database::new(DbConfig::from_env()?).await?;
    let outcome = db.quotes().quote(&request).await;
    db.close().await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
