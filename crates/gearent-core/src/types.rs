//! # Domain Types
//!
//! Core domain types used throughout GeaRent.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  category_id    │   │  status         │   │  order_id (FK)  │       │
//! │  │  price_per_day  │   │  total_amount   │   │  method/status  │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ 1..n                                  │
//! │  ┌─────────────────┐   ┌────────▼────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │   OrderItem     │   │     Review      │       │
//! │  │  name, slug     │   │  qty × days     │   │  rating 1..=5   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  User / AuthTokens live only in the REST backend and the cart store.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identifiers
//! The catalog database issues UUID strings while the REST backend issues
//! integers. [`Id`] accepts both on the wire and always carries a string.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Identifier
// =============================================================================

/// Entity identifier.
///
/// Deserializes from a JSON number or a JSON string and serializes as a
/// string, so `1` and `"1"` name the same product.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Self {
        Id(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! id_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Id {
                fn from(value: $ty) -> Self {
                    Id(value.to_string())
                }
            }
        )*
    };
}

id_from_integer!(i32, i64, u32, u64);

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id(value)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Id(n.to_string()),
            RawId::Text(s) => Id(s),
        })
    }
}

// =============================================================================
// Users & Sessions
// =============================================================================

/// Role of an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    #[serde(alias = "user")]
    Customer,
    Admin,
}

/// Snapshot of the signed-in user kept in the cart store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Bearer credentials issued by the REST backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category ("Bikes", "Camping", "Water Sports", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: Id,
    pub name: String,
    /// URL segment, unique.
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A piece of rentable equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Id,
    pub category_id: Option<Id>,
    pub name: String,
    pub description: Option<String>,
    /// Rental price for one unit for one day.
    pub price_per_day: Money,
    /// Units available to rent.
    pub stock: i64,
    pub image_url: Option<String>,
    /// Inactive products are hidden from the storefront (soft delete).
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if `quantity` units can be rented right now.
    pub fn can_rent(&self, quantity: u32) -> bool {
        self.is_active && self.stock >= quantity as i64
    }
}

/// Fields for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub category_id: Option<Id>,
    pub name: String,
    pub description: Option<String>,
    pub price_per_day: Money,
    pub stock: i64,
    pub image_url: Option<String>,
}

/// Partial update for a product; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub category_id: Option<Id>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_per_day: Option<Money>,
    pub stock: Option<i64>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Fields for creating or replacing a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

/// Lifecycle of a rental order.
///
/// ```text
/// Pending ──► Confirmed ──► Renting ──► Returned
///    │            │
///    └────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Renting,
    Returned,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Renting => "renting",
            OrderStatus::Returned => "returned",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether an order in this status may move to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Renting)
                | (Confirmed, Cancelled)
                | (Renting, Returned)
        )
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Returned | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "renting" => Ok(OrderStatus::Renting),
            "returned" => Ok(OrderStatus::Returned),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["pending", "confirmed", "renting", "returned", "cancelled"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

/// A rental order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: Id,
    pub user_id: Id,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub address_id: Option<Id>,
    /// First rental day, if the shopper picked one.
    pub rental_start: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order, frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: Id,
    pub order_id: Id,
    pub product_id: Id,
    pub product_name: String,
    pub price_per_day: Money,
    pub quantity: i64,
    pub duration_days: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.price_per_day * self.quantity * self.duration_days
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// One line of a checkout request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: Id,
    pub quantity: u32,
    pub duration_days: u32,
}

/// Checkout request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub items: Vec<NewOrderLine>,
    pub address_id: Option<Id>,
    pub rental_start: Option<NaiveDate>,
    pub total_amount: Money,
}

// =============================================================================
// Addresses
// =============================================================================

/// A delivery/pickup address on the shopper's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: Id,
    pub user_id: Option<Id>,
    pub recipient: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub postal_code: String,
    pub is_default: bool,
}

/// Fields for creating or replacing an address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAddress {
    pub recipient: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub postal_code: String,
    pub is_default: bool,
}

// =============================================================================
// Reviews
// =============================================================================

/// A product review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Review {
    pub id: Id,
    pub product_id: Id,
    pub user_id: Option<Id>,
    pub author_name: Option<String>,
    /// 1 through 5.
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for posting a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub product_id: Id,
    pub rating: i64,
    pub comment: Option<String>,
}

/// Mean rating, or `None` when there are no reviews.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: i64 = reviews.iter().map(|r| r.rating).sum();
    Some(sum as f64 / reviews.len() as f64)
}

// =============================================================================
// Payments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    BankTransfer,
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// A payment against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Id,
    pub order_id: Id,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Payment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub order_id: Id,
    pub amount: Money,
    pub method: PaymentMethod,
}

// =============================================================================
// Unit Tests
// =============================================================================
