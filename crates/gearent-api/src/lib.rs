//! # gearent-api: REST Client for the GeaRent Backend
//!
//! Typed calls against the external rental API. Everything that comes back
//! is normalized into `gearent-core` types before it leaves this crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GeaRent Data Flow                                │
//! │                                                                         │
//! │  Page loader (product list, checkout, my orders)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   gearent-api (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌───────────────────┐ │   │
//! │  │   │  ApiClient   │──►│  endpoints   │──►│       wire        │ │   │
//! │  │   │  token, http │   │ auth, orders │   │ envelopes, DTOs   │ │   │
//! │  │   │  status map  │   │ products ... │   │ → core types      │ │   │
//! │  │   └──────────────┘   └──────────────┘   └───────────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  REST backend (/api/...)                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - `ApiClient`, bearer token, status mapping
//! - [`endpoints`] - One handle per resource (`api.orders()`, ...)
//! - [`wire`] - Response shapes and request bodies
//! - [`error`] - API error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gearent_api::{ApiClient, ProductQuery};
//!
//! let api = ApiClient::new("http://localhost:4000", ApiClient::DEFAULT_TIMEOUT)?;
//! let page = api.products().list(&ProductQuery::matching("kayak")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod endpoints;
pub mod error;
pub mod wire;

#[cfg(any(test, feature = "test-util"))]
pub mod test_server;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::ApiClient;
pub use endpoints::{ImageUpload, NewAccount, ProductQuery, Registration, Session};
pub use error::{ApiError, ApiResult};
pub use wire::Page;
