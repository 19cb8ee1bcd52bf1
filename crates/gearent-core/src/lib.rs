//! # gearent-core: Pure Domain Logic for GeaRent
//!
//! Money, catalog entities, validation and the persisted cart store for the
//! sporting-goods rental storefront. Nothing in here talks to a database or
//! the network; persistence goes through the [`storage::StateStorage`] port.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GeaRent Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 storefront (pages, actions, CLI)                │   │
//! │  └───────────────┬──────────────────────────────┬──────────────────┘   │
//! │                  │                              │                       │
//! │  ┌───────────────▼──────────────────────────────▼──────────────────┐   │
//! │  │               ★ gearent-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ Booking   │  │   rules   │  │   │
//! │  │   │  Order    │  │  totals   │  │  Store    │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └─────┬─────┘  └───────────┘  │   │
//! │  │                                       │ storage port           │   │
//! │  └───────────────────────────────────────┼─────────────────────────┘   │
//! │                  ┌───────────────────────┴──────────┐                  │
//! │  ┌───────────────▼───────────────┐  ┌───────────────▼──────────────┐   │
//! │  │ gearent-db (SQLite, kv store) │  │ gearent-api (REST backend)   │   │
//! │  └───────────────────────────────┘  └──────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Review, User, ...)
//! - [`money`] - Integer money with rental totals
//! - [`cart`] - The booking store (cart + signed-in user)
//! - [`storage`] - Storage port and in-memory adapter
//! - [`error`] - Domain error types
//! - [`validation`] - Form and input rules
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gearent_core::cart::{BookingStore, CartItem};
//! use gearent_core::storage::MemoryStorage;
//! use gearent_core::Money;
//!
//! let mut store = BookingStore::load(Arc::new(MemoryStorage::new())).await?;
//! store.add_item(CartItem::new(1, "Bike", Money::new(50_000)).with_duration(3)).await?;
//! assert_eq!(store.summary().total.amount(), 150_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod storage;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{BookingState, BookingStore, CartItem, CartSummary};
pub use error::{CoreError, StoreError, ValidationError};
pub use money::Money;
pub use storage::{MemoryStorage, StateStorage};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum units of one product in a single rental line.
pub const MAX_ITEM_QUANTITY: u32 = 99;

/// Longest rental period a shopper can book, in days.
pub const MAX_RENTAL_DAYS: u32 = 30;
