//! # Seed Data Generator
//!
//! Populates a development database with a small catalog, a bank account,
//! a couple of coupons and the shipping configuration.
//!
//! ## Usage
//! ```bash
//! cargo run -p storefront-db --bin seed
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/storefront.db
//! ```
//!
//! Admin accounts are not seeded here: they need an argon2 hash, which the
//! API creates through `POST /api/admins`.

use chrono::{Duration, Utc};
use std::env;
use storefront_core::{BankAccount, DiscountType, Product, Promotion, ShippingConfig};
use storefront_db::{Database, DbConfig};
use uuid::Uuid;

/// (category, sku prefix, names)
const CATALOG: &[(&str, &str, &[&str])] = &[
    (
        "apparel",
        "APP",
        &["Linen Shirt", "Cotton Tee", "Denim Jacket", "Wool Scarf", "Canvas Cap"],
    ),
    (
        "home",
        "HOM",
        &["Ceramic Mug", "Oak Cutting Board", "Linen Napkins", "Glass Carafe", "Soy Candle"],
    ),
    (
        "stationery",
        "STA",
        &["Dot Grid Notebook", "Brass Pen", "Desk Planner", "Washi Tape Set"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./data/storefront.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./data/storefront.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Storefront Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let now = Utc::now();
    let mut generated = 0;

    for (category_idx, (category, prefix, names)) in CATALOG.iter().enumerate() {
        for (idx, name) in names.iter().enumerate() {
            let seed = category_idx * 10 + idx;
            let product = Product {
                id: Uuid::new_v4().to_string(),
                sku: format!("{}-{:03}", prefix, idx + 1),
                name: name.to_string(),
                description: Some(format!("{} from the {} collection", name, category)),
                // $9.00 - $88.00
                price_cents: 900 + ((seed * 731) % 80) as i64 * 100,
                stock: 5 + (seed % 20) as i64,
                image_url: None,
                category: Some(category.to_string()),
                is_active: true,
                created_at: now,
                updated_at: now,
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.sku, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ Generated {} products", generated);

    db.bank_accounts()
        .insert(&BankAccount {
            id: Uuid::new_v4().to_string(),
            bank_name: "BBVA".to_string(),
            account_holder: "Storefront Demo SA de CV".to_string(),
            account_number: "0123 4567 8901".to_string(),
            routing_code: Some("012180001234567897".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;
    println!("✓ Added bank account");

    let coupons = [
        ("WELCOME10", DiscountType::Percentage, 1000, None),
        ("TAKE200", DiscountType::Fixed, 20000, Some(50)),
        ("SHIPFREE", DiscountType::FreeShipping, 0, None),
    ];
    for (code, discount_type, value, max_uses) in coupons {
        db.promotions()
            .insert(&Promotion {
                id: Uuid::new_v4().to_string(),
                code: code.to_string(),
                description: None,
                discount_type,
                discount_value: value,
                starts_at: Some(now),
                ends_at: Some(now + Duration::days(90)),
                max_uses,
                uses: 0,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    println!("✓ Added {} coupons", coupons.len());

    db.promotions()
        .save_shipping_config(&ShippingConfig::with_default_fee(9900))
        .await?;
    println!("✓ Shipping fee set to $99.00");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
