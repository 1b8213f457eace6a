//! # Seed Data Generator
//!
//! Populates the database with a demo jersey catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./storefront_dev.db
//! cargo run -p storefront-db --bin seed
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/storefront.db
//! ```
//!
//! ## Generated Catalog
//! One product per team, each with:
//! - A sized "Player Edition" variant (per-size prices)
//! - A flat-priced fabric variant
//! - Every fifth team gets a variant whose size table was saved corrupted,
//!   so the lenient parsing path can be seen in the logs

use serde_json::{json, Value};
use std::env;
use storefront_core::{Money, Product, RawVariant};
use storefront_db::{Database, DbConfig};

/// Teams to generate jerseys for.
const TEAMS: &[&str] = &[
    "Abahani",
    "Mohammedan",
    "Bashundhara Kings",
    "Sheikh Jamal",
    "Dhaka Wanderers",
    "Brothers Union",
    "Rahmatganj",
    "Fortis",
    "Chittagong Abahani",
    "Muktijoddha",
];

/// Sizes and their surcharge over the base price, in major units.
const SIZES: &[(&str, i64)] = &[("S", 0), ("M", 0), ("L", 50), ("XL", 100), ("XXL", 150)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./storefront_dev.db");

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
                println!("  -d, --db <PATH>    Database file path (default: ./storefront_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Storefront Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut variants = 0;

    for (index, team) in TEAMS.iter().enumerate() {
        let product = generate_product(team, index);

        if let Err(e) = db.catalog().insert_product(&product).await {
            eprintln!("Failed to insert {}: {}", product.slug, e);
            continue;
        }

        for (position, variant) in generate_variants(&product, index).iter().enumerate() {
            db.catalog()
                .insert_variant(&product.id, position as i64, variant)
                .await?;
            variants += 1;
        }
    }

    println!();
    println!(
        "✓ Generated {} products and {} variants in {:?}",
        TEAMS.len(),
        variants,
        start.elapsed()
    );

    // Show the resolved price range for the first few products
    println!();
    for product in db.catalog().list_active(3).await? {
        let variants = db.catalog().list_variants(&product.id).await?;
        let info = product.price_info(&variants);
        println!(
            "  {}: {} - {} ({} variants)",
            product.name,
            info.min_price,
            info.max_price,
            variants.len()
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one jersey product.
fn generate_product(team: &str, seed: usize) -> Product {
    let slug = format!("{}-home-jersey", team.to_lowercase().replace(' ', "-"));
    let base_price = 1200 + ((seed * 70) % 500) as i64;

    Product {
        id: uuid::Uuid::new_v4().to_string(),
        name: format!("{} Home Jersey", team),
        slug: slug.clone(),
        price: Money::from_major(base_price),
        compare_price: (seed % 3 == 0).then(|| Money::from_major(base_price + 300)),
        images: vec![format!("/images/{}/front.jpg", slug), format!("/images/{}/back.jpg", slug)],
        is_active: true,
        is_featured: seed < 3,
        average_rating: 3.5 + (seed % 4) as f32 * 0.5,
        review_count: (seed * 7 % 40) as u32,
        category_id: Some("jerseys".to_string()),
    }
}

/// Generates the variants for one product.
fn generate_variants(product: &Product, seed: usize) -> Vec<RawVariant> {
    let base = product.price.major();

    let size_table: Vec<Value> = SIZES
        .iter()
        .map(|(size, surcharge)| json!({ "size": size, "price": base + 200 + surcharge }))
        .collect();

    let mut variants = vec![
        RawVariant {
            id: uuid::Uuid::new_v4().to_string(),
            name: Some("Edition".to_string()),
            value: Some("Player".to_string()),
            // Stored serialized, the way the admin form saves it
            sizes: Some(Value::String(Value::Array(size_table).to_string())),
            ..RawVariant::default()
        },
        RawVariant {
            id: uuid::Uuid::new_v4().to_string(),
            fabric_type: Some("Mesh".to_string()),
            price: Some(json!(base + 100)),
            ..RawVariant::default()
        },
    ];

    if seed % 5 == 0 {
        variants.push(RawVariant {
            id: uuid::Uuid::new_v4().to_string(),
            tracksuit_type: Some("Training".to_string()),
            sizes: Some(Value::String(r#"[{"size":"M","price":"#.to_string())),
            ..RawVariant::default()
        });
    }

    variants
}
