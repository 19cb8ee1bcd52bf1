//! # Seed Data Generator
//!
//! Fills the catalog database with sample rental gear for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./gearent_dev.db
//! cargo run -p gearent-db --bin seed
//!
//! # Specify database path, add demo orders
//! cargo run -p gearent-db --bin seed -- --db ./data/gearent.db --orders 20
//! ```
//!
//! ## Generated Data
//! - Five categories (bikes, camping, water sports, winter sports, ball sports)
//! - Four to five products per category, daily prices ₩5,000 - ₩90,000
//! - One or two reviews per product
//! - Optional demo orders spread over the order statuses

use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gearent_core::validation::slugify;
use gearent_core::{
    Id, Money, NewCategory, NewOrder, NewOrderLine, NewProduct, NewReview, OrderStatus,
};
use gearent_db::{Database, DbConfig};

/// (category, description, [(product, price per day, stock)])
const CATALOG: &[(&str, &str, &[(&str, i64, i64)])] = &[
    (
        "Bikes",
        "Road, mountain and city bikes with helmets",
        &[
            ("Trek Marlin 5 Mountain Bike", 50_000, 4),
            ("Giant Contend Road Bike", 60_000, 3),
            ("Brompton Folding Bike", 45_000, 2),
            ("Kids Balance Bike", 15_000, 6),
            ("Bike Helmet", 5_000, 20),
        ],
    ),
    (
        "Camping",
        "Tents, sleeping gear and camp kitchens",
        &[
            ("4-Person Dome Tent", 30_000, 8),
            ("Down Sleeping Bag", 12_000, 15),
            ("Two-Burner Camp Stove", 10_000, 10),
            ("Folding Camp Chair", 5_000, 30),
        ],
    ),
    (
        "Water Sports",
        "Paddle and surf equipment",
        &[
            ("Sit-On-Top Sea Kayak", 70_000, 3),
            ("Inflatable SUP Board", 40_000, 5),
            ("Wetsuit 3/2mm", 15_000, 12),
            ("Snorkel Set", 8_000, 25),
        ],
    ),
    (
        "Winter Sports",
        "Ski and snowboard packages",
        &[
            ("All-Mountain Ski Package", 90_000, 6),
            ("Snowboard with Bindings", 80_000, 6),
            ("Ski Goggles", 7_000, 20),
            ("Snowshoes", 20_000, 8),
        ],
    ),
    (
        "Ball Sports",
        "Balls, nets and goals for the park",
        &[
            ("Soccer Ball", 20_000, 10),
            ("Portable Badminton Net", 15_000, 4),
            ("Basketball", 10_000, 10),
            ("Pop-Up Soccer Goals (pair)", 25_000, 3),
        ],
    ),
];

const REVIEWERS: &[&str] = &["Kim Minji", "Lee Junho", "Park Seoyeon", "Choi Hyun"];

const COMMENTS: &[&str] = &[
    "Clean and well maintained.",
    "Pickup was quick, would rent again.",
    "Did the job for a weekend trip.",
    "A bit worn but worked fine.",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./gearent_dev.db");
    let mut order_count: usize = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    order_count = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("GeaRent Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./gearent_dev.db)");
                println!("  -o, --orders <N>    Demo orders to create (default: 0)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding catalog");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        println!("Delete {} to regenerate.", db_path);
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut product_ids: Vec<Id> = Vec::new();
    let mut review_count = 0usize;

    for (name, description, products) in CATALOG {
        let category = db
            .categories()
            .insert(&NewCategory {
                name: name.to_string(),
                slug: slugify(name),
                description: Some(description.to_string()),
            })
            .await?;

        for (product_name, price, stock) in products.iter() {
            let product = db
                .products()
                .insert(&NewProduct {
                    category_id: Some(category.id.clone()),
                    name: product_name.to_string(),
                    description: Some(format!("{} for rent by the day.", product_name)),
                    price_per_day: Money::new(*price),
                    stock: *stock,
                    image_url: None,
                })
                .await?;

            let seed = product_ids.len();
            for r in 0..(1 + seed % 2) {
                let n = seed + r;
                db.reviews()
                    .insert(
                        &NewReview {
                            product_id: product.id.clone(),
                            rating: 3 + (n % 3) as i64,
                            comment: Some(COMMENTS[n % COMMENTS.len()].to_string()),
                        },
                        None,
                        Some(REVIEWERS[n % REVIEWERS.len()]),
                    )
                    .await?;
                review_count += 1;
            }

            product_ids.push(product.id);
        }
    }

    const STATUS_CYCLE: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Renting,
        OrderStatus::Returned,
        OrderStatus::Cancelled,
    ];

    for n in 0..order_count {
        let lines = (0..(1 + n % 3))
            .map(|k| NewOrderLine {
                product_id: product_ids[(n * 7 + k * 3) % product_ids.len()].clone(),
                quantity: 1 + (k as u32 % 2),
                duration_days: 1 + (n as u32 % 5),
            })
            .collect();

        let detail = db
            .orders()
            .create(
                &Id::from(1 + (n % 4) as u32),
                &NewOrder {
                    items: lines,
                    address_id: None,
                    rental_start: None,
                    total_amount: Money::zero(),
                },
            )
            .await?;

        let status = STATUS_CYCLE[n % STATUS_CYCLE.len()];
        if status != OrderStatus::Pending {
            db.orders().update_status(&detail.order.id, status).await?;
        }
    }

    info!(
        categories = CATALOG.len(),
        products = product_ids.len(),
        reviews = review_count,
        orders = order_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    Ok(())
}
