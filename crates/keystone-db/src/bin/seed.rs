//! # Seed Data Generator
//!
//! Populates the database with a development catalog.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p keystone-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p keystone-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p keystone-db --bin seed -- --db ./data/keystone.db
//! ```
//!
//! ## Generated Products
//! Back-office stock across departments:
//! - Furniture (desks, chairs, shelving)
//! - Lighting (lamps, bulbs)
//! - Stationery (paper, pens, binders)
//! - Electronics (cables, chargers, keyboards)
//!
//! Each product has:
//! - Unique SKU: `{DEPT}-{NAME}-{INDEX}`
//! - Price: $1.99 - $9.99 plus a variant add-on
//! - Stock: 0 - 60, reorder threshold 0 - 9

use std::env;
use tracing_subscriber::EnvFilter;

use keystone_core::Product;
use keystone_db::repository::product;
use keystone_db::{Database, DbConfig};

/// Departments for realistic test data
const DEPARTMENTS: &[(&str, &[&str])] = &[
    (
        "FUR",
        &[
            "Standing Desk",
            "Office Chair",
            "Filing Cabinet",
            "Bookshelf",
            "Side Table",
            "Monitor Stand",
            "Footrest",
            "Coat Rack",
        ],
    ),
    (
        "LGT",
        &[
            "Desk Lamp",
            "Floor Lamp",
            "LED Bulb",
            "Light Strip",
            "Clip Lamp",
            "Night Light",
        ],
    ),
    (
        "STA",
        &[
            "Copy Paper",
            "Gel Pen",
            "Ring Binder",
            "Sticky Notes",
            "Stapler",
            "Envelope",
            "Notebook",
            "Marker Set",
            "Paper Clips",
            "Label Tape",
        ],
    ),
    (
        "ELC",
        &[
            "USB Cable",
            "Wall Charger",
            "Keyboard",
            "Mouse",
            "Webcam",
            "Headset",
            "Power Strip",
            "HDMI Cable",
        ],
    ),
];

/// Variants with their price add-on in cents
const VARIANTS: &[(&str, i64)] = &[
    ("Standard", 0),
    ("Compact", 50),
    ("Large", 200),
    ("Pro", 500),
    ("Black", 0),
    ("White", 0),
    ("Pack of 5", 300),
    ("Pack of 10", 550),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,keystone_db=info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./keystone_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Keystone Back Office Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./keystone_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Keystone Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = product::count(db.pool()).await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    // One transaction for the whole batch.
    let mut uow = db.begin().await?;

    'outer: for (dept_idx, (dept_code, names)) in DEPARTMENTS.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (variant_idx, (variant, price_addon)) in VARIANTS.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let p = generate_product(
                    dept_code,
                    name,
                    variant,
                    *price_addon,
                    dept_idx * 1000 + name_idx * 20 + variant_idx,
                );

                if let Err(e) = product::insert(uow.conn(), &p).await {
                    eprintln!("Failed to insert {}: {}", p.sku, e);
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    uow.commit().await?;

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let low = product::list_low_stock(db.pool()).await?;
    println!("  Low stock at start: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Generates a single product with deterministic pseudo-random data.
fn generate_product(dept: &str, name: &str, variant: &str, price_addon: i64, seed: usize) -> Product {
    let code: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:04}", dept, code, seed);

    let base_price = 199 + ((seed * 17) % 800) as i64;
    let quantity = (seed % 61) as i64;
    let min_stock_level = (seed % 10) as i64;

    product::new_product(
        sku,
        format!("{} {}", name, variant),
        base_price + price_addon,
        quantity,
        min_stock_level,
    )
}
