//! # Seed Data Generator
//!
//! Populates a development database with products and sales.
//!
//! ## Usage
//! ```bash
//! # 200 products (default), about a third of them sold from
//! cargo run -p ims-db --bin seed
//!
//! cargo run -p ims-db --bin seed -- --count 1000 --db ./data/ims.db
//! ```
//!
//! Apparel gets per-size stock (`XS`..`XL` or shoe sizes); accessories get a
//! flat count. Every third product gets a sale so returns can be tried out
//! right away.

use chrono::Utc;
use std::collections::BTreeMap;
use std::env;
use tracing::warn;

use ims_core::{NewProduct, SaleRequest, SizeQuantities, StockLevel, UNSIZED_LABEL};
use ims_db::{init_tracing, Database, DbConfig, DEFAULT_LOG_FILTER};

const APPAREL: &[&str] = &[
    "Oxford Shirt",
    "Crew Tee",
    "Polo",
    "Hoodie",
    "Denim Jacket",
    "Chinos",
    "Cargo Shorts",
    "Rain Shell",
    "Fleece Vest",
    "Linen Shirt",
];

const FOOTWEAR: &[&str] = &["Runner", "Loafer", "Chelsea Boot", "Court Sneaker", "Sandal"];

const ACCESSORIES: &[&str] = &[
    "Leather Belt",
    "Wool Scarf",
    "Canvas Tote",
    "Beanie",
    "Sunglasses",
    "Card Wallet",
];

const GARMENT_SIZES: &[&str] = &["XS", "S", "M", "L", "XL"];

const SHOE_SIZES: &[&str] = &["40", "41", "42", "43", "44", "45"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("IMS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: $IMS_DB_PATH or ./ims.db)");
                println!("  -h, --help         Show this help message");
                println!();
                println!("Logging: RUST_LOG (default: {})", DEFAULT_LOG_FILTER);
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    let config = match db_path {
        Some(path) => DbConfig::new(path),
        None => DbConfig::from_env()?,
    };

    println!("🌱 IMS Seed Data Generator");
    println!("==========================");
    println!("Database: {}", config.database_path.display());
    println!("Products: {}", count);
    println!();

    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut sold = 0;

    for seed in 0..count {
        let product = match db.products().insert(generate_product(seed)).await {
            Ok(product) => product,
            Err(e) => {
                warn!(seed, error = %e, "Failed to insert product");
                continue;
            }
        };
        generated += 1;

        if seed % 3 == 0 && product.in_stock {
            if let Some(request) = generate_sale(&product.id, &product.stock, seed) {
                match db.sales_service().record_sale(request).await {
                    Ok(_) => sold += 1,
                    Err(e) => warn!(product_id = %product.id, error = %e, "Failed to record sale"),
                }
            }
        }

        if generated % 50 == 0 {
            println!("  Generated {} products...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products and {} sales in {:?}", generated, sold, elapsed);
    println!("  Sales on file: {}", db.sales().count().await?);

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product. Deterministic in `seed`.
fn generate_product(seed: usize) -> NewProduct {
    let base_price = 999 + ((seed * 37) % 9000) as i64;

    match seed % 3 {
        0 => {
            let name = APPAREL[seed % APPAREL.len()];
            NewProduct {
                name: format!("{} #{:04}", name, seed),
                price_cents: base_price,
                stock: StockLevel::Sized(sized_stock(GARMENT_SIZES, seed)),
            }
        }
        1 => {
            let name = FOOTWEAR[seed % FOOTWEAR.len()];
            NewProduct {
                name: format!("{} #{:04}", name, seed),
                price_cents: base_price + 3000,
                stock: StockLevel::Sized(sized_stock(SHOE_SIZES, seed)),
            }
        }
        _ => {
            let name = ACCESSORIES[seed % ACCESSORIES.len()];
            NewProduct {
                name: format!("{} #{:04}", name, seed),
                price_cents: base_price / 2,
                stock: StockLevel::Flat((seed % 41) as u32),
            }
        }
    }
}

/// Stock of 0..=12 per size; some sizes are sold out.
fn sized_stock(sizes: &[&str], seed: usize) -> SizeQuantities {
    sizes
        .iter()
        .enumerate()
        .map(|(idx, size)| (*size, ((seed + idx * 7) % 13) as u32))
        .collect()
}

/// Sells one or two units of the first size that has stock.
fn generate_sale(product_id: &str, stock: &StockLevel, seed: usize) -> Option<SaleRequest> {
    let (size, available) = match stock {
        StockLevel::Sized(sizes) => sizes.iter().find(|(_, qty)| *qty > 0)?,
        StockLevel::Flat(qty) if *qty > 0 => (UNSIZED_LABEL, *qty),
        StockLevel::Flat(_) => return None,
    };

    let quantity = i64::from(available.min(1 + (seed % 2) as u32));
    let mut quantities = BTreeMap::new();
    quantities.insert(size.to_string(), quantity);

    Some(SaleRequest {
        product_id: product_id.to_string(),
        quantities,
        discount_cents: 0,
        sale_date: Utc::now().date_naive(),
    })
}
