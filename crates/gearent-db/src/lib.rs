//! # gearent-db: Catalog Database for GeaRent
//!
//! SQLite persistence for the rental catalog (products, categories, orders,
//! reviews), the durable backend of the cart store, and the product image
//! bucket.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GeaRent Data Flow                                │
//! │                                                                         │
//! │  Page loader (home, admin dashboard) / Mutation action                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    gearent-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CategoryRepo  │    │ 001_init.sql │  │   │
//! │  │   │               │    │ OrderRepo     │    │              │  │   │
//! │  │   │               │    │ ReviewRepo    │    │              │  │   │
//! │  │   │               │    │ SqliteStorage │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   ImageBucket (bucket.rs) ── files on disk + public URL        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (gearent.db)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`bucket`] - Product image files
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gearent_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("gearent.db")).await?;
//! let shelf = db.products().list_newest(8).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bucket;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use bucket::{ImageBucket, StoredImage};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::kv::SqliteStorage;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::review::ReviewRepository;
