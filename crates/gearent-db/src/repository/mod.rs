//! # Repository Module
//!
//! Database repository implementations for the GeaRent catalog.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Page loader / mutation action                                         │
//! │       │                                                                 │
//! │       │  db.products().list_newest(8)                                  │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list_newest / list_by_category / search                           │
//! │  ├── get_by_id                                                         │
//! │  ├── insert / update / set_active / set_image_url                      │
//! │  └── delete                                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and search
//! - [`CategoryRepository`](category::CategoryRepository) - Category CRUD
//! - [`OrderRepository`](order::OrderRepository) - Orders, lines and admin stats
//! - [`ReviewRepository`](review::ReviewRepository) - Product reviews
//! - [`SqliteStorage`](kv::SqliteStorage) - Key/value backend for the cart store

pub mod category;
pub mod kv;
pub mod order;
pub mod product;
pub mod review;

use chrono::Utc;
use gearent_core::Id;
use uuid::Uuid;

/// Generates a new entity ID.
pub fn generate_id() -> Id {
    Id::new(Uuid::new_v4().to_string())
}

/// Current time, truncated to whole microseconds.
///
/// SQLite stores timestamps as text; truncating keeps a value read back
/// equal to the one that was written.
pub(crate) fn now() -> chrono::DateTime<Utc> {
    let now = Utc::now();
    chrono::DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}
