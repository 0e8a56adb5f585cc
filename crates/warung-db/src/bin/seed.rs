//! # Seed Data Generator
//!
//! Populates a database with a small demo shop for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p warung-db --bin seed
//!
//! # Specify database path
//! cargo run -p warung-db --bin seed -- --db ./data/warung.db
//! ```
//!
//! ## Generated Data
//! - Categories with products, each stocked in `pcs` and `dus`
//! - One supplier
//! - An `admin` user (password `admin123`) and a `kasir` seller
//!   (password `kasir123`)

use std::env;
use warung_core::{NewProduct, NewStockEntry, NewSupplier, NewUser, ProductFilter, UserRole};
use warung_db::{Database, DbConfig};

/// Category name, then (product name, price per pcs, pcs per dus).
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Minuman",
        &[
            ("Teh Botol Sosro 350ml", 5_000, 24),
            ("Aqua 600ml", 3_500, 24),
            ("Kopi Kapal Api Sachet", 1_500, 120),
            ("Susu Ultra 250ml", 6_500, 24),
        ],
    ),
    (
        "Makanan",
        &[
            ("Indomie Goreng", 3_100, 40),
            ("Beras Pandan Wangi 5kg", 78_000, 4),
            ("Gula Pasir 1kg", 17_500, 10),
        ],
    ),
    (
        "Kebutuhan Rumah",
        &[
            ("Sabun Lifebuoy 75g", 4_000, 72),
            ("Rinso 800g", 24_000, 12),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./warung_dev.db");

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
                println!("Warung POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./warung_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Warung POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list(&ProductFilter::default()).await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} products", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalog...");

    let mut generated = 0;
    for (category_name, products) in CATALOG {
        let category = db.categories().create(category_name).await?;

        for (index, (name, price, per_box)) in products.iter().enumerate() {
            let product = db
                .products()
                .create(&NewProduct {
                    category_id: category.id.clone(),
                    name: name.to_string(),
                    description: None,
                    image: None,
                })
                .await?;

            let pcs = 12 + (index as i64 * 7) % 30;
            for (unit, quantity, unit_price) in [("pcs", pcs, *price), ("dus", 2, price * per_box)] {
                db.stock()
                    .create(&NewStockEntry {
                        product_id: product.id.clone(),
                        unit: unit.to_string(),
                        quantity: Some(quantity),
                        unit_price,
                    })
                    .await?;
            }

            generated += 1;
        }
        println!("  {} {}: {} products", category.id, category.name, products.len());
    }

    let supplier = db
        .suppliers()
        .create(&NewSupplier {
            name: "CV Sumber Rejeki".to_string(),
            phone: Some("081234567890".to_string()),
            notes: Some("Grosir sembako".to_string()),
        })
        .await?;
    println!("  {} {}", supplier.id, supplier.name);

    for (username, password, name, role) in [
        ("admin", "admin123", "Pemilik Toko", UserRole::Admin),
        ("kasir", "kasir123", "Kasir Depan", UserRole::Seller),
    ] {
        let user = db
            .users()
            .create(&NewUser {
                username: username.to_string(),
                password: password.to_string(),
                name: name.to_string(),
                role,
                phone: None,
                gender: None,
                address: None,
            })
            .await?;
        println!("  {} {} ({:?})", user.id, user.username, user.role);
    }

    println!();
    println!("✓ Generated {} products", generated);
    println!("✓ Seed complete!");

    Ok(())
}
