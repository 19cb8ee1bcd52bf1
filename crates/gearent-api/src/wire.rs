//! # Wire Format
//!
//! Every response-shape quirk of the REST backend is absorbed here. Code
//! outside this module only sees `gearent-core` types.
//!
//! ## Accepted Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Single entity          Envelope<T>                                     │
//! │    { ...T }                                                             │
//! │    { "data": { ...T } }                                                 │
//! │                                                                         │
//! │  List                   ListEnvelope<T>                                 │
//! │    [ T, ... ]                                                           │
//! │    { "data":    [ T, ... ], "total": n, "page": p }                     │
//! │    { "items":   [ T, ... ], ... }                                       │
//! │    { "results": [ T, ... ], ... }                                       │
//! │    { "data": { "items": [ T, ... ], "total": n } }                      │
//! │                                                                         │
//! │  Fields                                                                 │
//! │    camelCase or snake_case names     pricePerDay | price_per_day       │
//! │    ids as numbers or strings         7 | "7"                           │
//! │    money as number or string         50000 | "50000.00"                │
//! │    timestamps with or without zone   "2024-05-01T09:00:00Z"            │
//! │                                      "2024-05-01 09:00:00"             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Request bodies go out in camelCase.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, ApiResult};
use gearent_core::validation::slugify;
use gearent_core::{
    Address, AuthTokens, Category, Id, Money, NewAddress, NewCategory, NewOrder, NewPayment,
    NewReview, Order, OrderDetail, OrderItem, OrderStatus, Payment, PaymentMethod, PaymentStatus,
    Product, ProductPatch, Review, User, UserRole,
};

// =============================================================================
// Envelopes
// =============================================================================

/// A single entity, bare or wrapped in `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

/// A list in any of the shapes the backend uses.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Data {
        data: Box<ListEnvelope<T>>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
    },
    Items {
        items: Vec<T>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
    },
    Results {
        results: Vec<T>,
        #[serde(default, alias = "count")]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
    },
}

/// A normalized list page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching rows on the server, when reported.
    pub total: Option<u64>,
    pub page: Option<u32>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
        }
    }
}

impl<T> ListEnvelope<T> {
    pub fn into_page(self) -> Page<T> {
        match self {
            ListEnvelope::Bare(items) => Page {
                items,
                total: None,
                page: None,
            },
            ListEnvelope::Data { data, total, page } => {
                let inner = data.into_page();
                Page {
                    items: inner.items,
                    total: total.or(inner.total),
                    page: page.or(inner.page),
                }
            }
            ListEnvelope::Items { items, total, page }
            | ListEnvelope::Results {
                results: items,
                total,
                page,
            } => Page { items, total, page },
        }
    }
}

/// Decodes a single entity.
pub fn decode_entity<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    Ok(envelope.into_inner())
}

/// Decodes a list in any accepted shape.
pub fn decode_list<T: DeserializeOwned>(body: &str) -> ApiResult<Page<T>> {
    let envelope: ListEnvelope<T> = serde_json::from_str(body)?;
    Ok(envelope.into_page())
}

/// Pulls a human-readable message out of an error body.
///
/// Tries `message`, `error` (string or `{message}`), `detail`, then falls
/// back to the raw text.
pub fn error_message(body: &str) -> String {
    let fallback = || {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "no details".to_string()
        } else {
            trimmed.chars().take(200).collect()
        }
    };

    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback();
    };

    let candidates = [
        value.get("message"),
        value.get("error").and_then(|e| e.get("message")),
        value.get("error"),
        value.get("detail"),
    ];

    let message = candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(fallback);
    message
}

// =============================================================================
// Lenient Field Decoders
// =============================================================================

mod lenient {
    use super::*;
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Int(i64),
        Float(f64),
        Text(String),
    }

    fn money_from_raw<E: Error>(raw: RawNumber) -> Result<Money, E> {
        match raw {
            RawNumber::Int(n) => Ok(Money::new(n)),
            RawNumber::Float(f) => Ok(Money::new(f.round() as i64)),
            RawNumber::Text(s) => {
                let cleaned: String = s.chars().filter(|c| *c != ',').collect();
                cleaned
                    .trim()
                    .parse::<f64>()
                    .map(|f| Money::new(f.round() as i64))
                    .map_err(|_| E::custom(format!("invalid amount: {s}")))
            }
        }
    }

    pub fn money<'de, D: Deserializer<'de>>(d: D) -> Result<Money, D::Error> {
        money_from_raw(RawNumber::deserialize(d)?)
    }

    pub fn money_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Money>, D::Error> {
        Option::<RawNumber>::deserialize(d)?
            .map(money_from_raw)
            .transpose()
    }

    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match RawNumber::deserialize(d)? {
            RawNumber::Int(n) => Ok(n),
            RawNumber::Float(f) => Ok(f as i64),
            RawNumber::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid integer: {s}"))),
        }
    }

    pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn timestamp_opt<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(s) => parse_timestamp(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {s}"))),
        }
    }

    pub fn date_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(s) => {
                let date = NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .ok()
                    .or_else(|| parse_timestamp(&s).map(|dt| dt.date_naive()));
                date.map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid date: {s}")))
            }
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_one() -> i64 {
    1
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// A nested `{ "id": .., "name": .. }` reference.
#[derive(Debug, Deserialize)]
struct NamedRef {
    id: Option<Id>,
    #[serde(default)]
    name: Option<String>,
}

// =============================================================================
// Users & Auth
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WireUser {
    id: Id,
    email: String,
    #[serde(default, alias = "username", alias = "userName")]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, alias = "phoneNumber", alias = "phone_number")]
    phone: Option<String>,
}

impl From<WireUser> for User {
    fn from(w: WireUser) -> Self {
        let role = match w.role.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("admin") => UserRole::Admin,
            _ => UserRole::Customer,
        };
        let name = w
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| w.email.split('@').next().unwrap_or_default().to_string());
        User {
            id: w.id,
            email: w.email,
            name,
            role,
            phone: w.phone,
        }
    }
}

/// `/me` answers bare, in `data`, or in `user`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserBody {
    Keyed { user: WireUser },
    Other(Envelope<WireUser>),
}

impl From<UserBody> for User {
    fn from(body: UserBody) -> Self {
        match body {
            UserBody::Keyed { user } => user.into(),
            UserBody::Other(envelope) => envelope.into_inner().into(),
        }
    }
}

/// Login, register and refresh responses.
#[derive(Debug, Deserialize)]
pub struct AuthBody {
    #[serde(default, alias = "accessToken", alias = "access_token")]
    token: Option<String>,
    #[serde(default, alias = "refreshToken")]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<WireUser>,
}

impl AuthBody {
    pub fn tokens(&self) -> Option<AuthTokens> {
        self.token.as_ref().map(|access| AuthTokens {
            access_token: access.clone(),
            refresh_token: self.refresh_token.clone(),
        })
    }

    pub fn into_parts(self) -> (Option<AuthTokens>, Option<User>) {
        let tokens = self.tokens();
        (tokens, self.user.map(User::from))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WireCategory {
    id: Id,
    name: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::timestamp_opt")]
    created_at: Option<DateTime<Utc>>,
}

impl From<WireCategory> for Category {
    fn from(w: WireCategory) -> Self {
        let slug = w.slug.unwrap_or_else(|| slugify(&w.name));
        Category {
            id: w.id,
            name: w.name,
            slug,
            description: w.description,
            created_at: w.created_at.unwrap_or_else(epoch),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireProduct {
    id: Id,
    #[serde(default, alias = "categoryId")]
    category_id: Option<Id>,
    #[serde(default)]
    category: Option<NamedRef>,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(
        alias = "pricePerDay",
        alias = "dailyPrice",
        alias = "price",
        deserialize_with = "lenient::money"
    )]
    price_per_day: Money,
    #[serde(default, alias = "quantity", deserialize_with = "lenient::integer")]
    stock: i64,
    #[serde(default, alias = "imageUrl", alias = "image")]
    image_url: Option<String>,
    #[serde(default = "default_true", alias = "isActive")]
    is_active: bool,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::timestamp_opt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt", deserialize_with = "lenient::timestamp_opt")]
    updated_at: Option<DateTime<Utc>>,
}

impl From<WireProduct> for Product {
    fn from(w: WireProduct) -> Self {
        let created_at = w.created_at.unwrap_or_else(epoch);
        Product {
            id: w.id,
            category_id: w.category_id.or(w.category.and_then(|c| c.id)),
            name: w.name,
            description: w.description,
            price_per_day: w.price_per_day,
            stock: w.stock,
            image_url: w.image_url,
            is_active: w.is_active,
            created_at,
            updated_at: w.updated_at.unwrap_or(created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

impl<'a> From<&'a NewCategory> for CategoryRequest<'a> {
    fn from(c: &'a NewCategory) -> Self {
        CategoryRequest {
            name: &c.name,
            slug: &c.slug,
            description: c.description.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatchRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<&'a Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_day: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl<'a> From<&'a ProductPatch> for ProductPatchRequest<'a> {
    fn from(p: &'a ProductPatch) -> Self {
        ProductPatchRequest {
            category_id: p.category_id.as_ref(),
            name: p.name.as_deref(),
            description: p.description.as_deref(),
            price_per_day: p.price_per_day,
            stock: p.stock,
            image_url: p.image_url.as_deref(),
            is_active: p.is_active,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WireOrderItem {
    #[serde(default)]
    id: Option<Id>,
    #[serde(default, alias = "orderId")]
    order_id: Option<Id>,
    #[serde(default, alias = "productId")]
    product_id: Option<Id>,
    #[serde(default)]
    product: Option<NamedRef>,
    #[serde(default, alias = "productName")]
    product_name: Option<String>,
    #[serde(
        default,
        alias = "pricePerDay",
        alias = "price",
        deserialize_with = "lenient::money_opt"
    )]
    price_per_day: Option<Money>,
    #[serde(default = "default_one", deserialize_with = "lenient::integer")]
    quantity: i64,
    #[serde(
        default = "default_one",
        alias = "durationDays",
        alias = "duration",
        alias = "days",
        deserialize_with = "lenient::integer"
    )]
    duration_days: i64,
}

impl WireOrderItem {
    fn into_item(self, order_id: &Id, index: usize) -> OrderItem {
        let (ref_id, ref_name) = match self.product {
            Some(p) => (p.id, p.name),
            None => (None, None),
        };
        let product_id = self.product_id.or(ref_id).unwrap_or_else(|| Id::new(""));
        OrderItem {
            id: self
                .id
                .unwrap_or_else(|| Id::new(format!("{}-{}", order_id, index + 1))),
            order_id: self.order_id.unwrap_or_else(|| order_id.clone()),
            product_name: self
                .product_name
                .or(ref_name)
                .unwrap_or_else(|| product_id.to_string()),
            product_id,
            price_per_day: self.price_per_day.unwrap_or_default(),
            quantity: self.quantity,
            duration_days: self.duration_days,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireOrder {
    id: Id,
    #[serde(default, alias = "userId")]
    user_id: Option<Id>,
    #[serde(default)]
    status: Option<String>,
    #[serde(
        default,
        alias = "totalAmount",
        alias = "totalPrice",
        alias = "total",
        deserialize_with = "lenient::money_opt"
    )]
    total_amount: Option<Money>,
    #[serde(default, alias = "addressId")]
    address_id: Option<Id>,
    #[serde(
        default,
        alias = "rentalStart",
        alias = "startDate",
        alias = "start_date",
        deserialize_with = "lenient::date_opt"
    )]
    rental_start: Option<NaiveDate>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::timestamp_opt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt", deserialize_with = "lenient::timestamp_opt")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "orderItems", alias = "order_items")]
    items: Vec<WireOrderItem>,
}

impl TryFrom<WireOrder> for OrderDetail {
    type Error = ApiError;

    fn try_from(w: WireOrder) -> Result<Self, Self::Error> {
        let status = match w.status.as_deref() {
            None => OrderStatus::Pending,
            Some(s) => s
                .parse::<OrderStatus>()
                .map_err(|_| ApiError::Decode(format!("unknown order status: {s}")))?,
        };

        let items: Vec<OrderItem> = w
            .items
            .into_iter()
            .enumerate()
            .map(|(i, item)| item.into_item(&w.id, i))
            .collect();

        let created_at = w.created_at.unwrap_or_else(epoch);
        let order = Order {
            total_amount: w
                .total_amount
                .unwrap_or_else(|| items.iter().map(OrderItem::line_total).sum()),
            id: w.id,
            user_id: w.user_id.unwrap_or_else(|| Id::new("")),
            status,
            address_id: w.address_id,
            rental_start: w.rental_start,
            created_at,
            updated_at: w.updated_at.unwrap_or(created_at),
        };

        Ok(OrderDetail { order, items })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest<'a> {
    pub product_id: &'a Id,
    pub quantity: u32,
    pub duration_days: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest<'a> {
    pub items: Vec<OrderLineRequest<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<&'a Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rental_start: Option<NaiveDate>,
    pub total_amount: Money,
}

impl<'a> From<&'a NewOrder> for OrderRequest<'a> {
    fn from(o: &'a NewOrder) -> Self {
        OrderRequest {
            items: o
                .items
                .iter()
                .map(|line| OrderLineRequest {
                    product_id: &line.product_id,
                    quantity: line.quantity,
                    duration_days: line.duration_days,
                })
                .collect(),
            address_id: o.address_id.as_ref(),
            rental_start: o.rental_start,
            total_amount: o.total_amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

// =============================================================================
// Addresses
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WireAddress {
    id: Id,
    #[serde(default, alias = "userId")]
    user_id: Option<Id>,
    #[serde(alias = "recipientName", alias = "recipient_name", alias = "name")]
    recipient: String,
    #[serde(default)]
    phone: String,
    #[serde(
        alias = "address",
        alias = "addressLine1",
        alias = "address_line1",
        alias = "address1"
    )]
    line1: String,
    #[serde(
        default,
        alias = "addressDetail",
        alias = "addressLine2",
        alias = "address_line2",
        alias = "address2"
    )]
    line2: Option<String>,
    #[serde(default, alias = "postalCode", alias = "zipCode", alias = "zip_code")]
    postal_code: String,
    #[serde(default, alias = "isDefault")]
    is_default: bool,
}

impl From<WireAddress> for Address {
    fn from(w: WireAddress) -> Self {
        Address {
            id: w.id,
            user_id: w.user_id,
            recipient: w.recipient,
            phone: w.phone,
            line1: w.line1,
            line2: w.line2,
            postal_code: w.postal_code,
            is_default: w.is_default,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest<'a> {
    pub recipient: &'a str,
    pub phone: &'a str,
    pub line1: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<&'a str>,
    pub postal_code: &'a str,
    pub is_default: bool,
}

impl<'a> From<&'a NewAddress> for AddressRequest<'a> {
    fn from(a: &'a NewAddress) -> Self {
        AddressRequest {
            recipient: &a.recipient,
            phone: &a.phone,
            line1: &a.line1,
            line2: a.line2.as_deref(),
            postal_code: &a.postal_code,
            is_default: a.is_default,
        }
    }
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WireReview {
    id: Id,
    #[serde(alias = "productId")]
    product_id: Id,
    #[serde(default, alias = "userId")]
    user_id: Option<Id>,
    #[serde(default)]
    user: Option<NamedRef>,
    #[serde(default, alias = "authorName", alias = "userName", alias = "user_name")]
    author_name: Option<String>,
    #[serde(deserialize_with = "lenient::integer")]
    rating: i64,
    #[serde(default, alias = "content")]
    comment: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::timestamp_opt")]
    created_at: Option<DateTime<Utc>>,
}

impl From<WireReview> for Review {
    fn from(w: WireReview) -> Self {
        let (ref_id, ref_name) = match w.user {
            Some(u) => (u.id, u.name),
            None => (None, None),
        };
        Review {
            id: w.id,
            product_id: w.product_id,
            user_id: w.user_id.or(ref_id),
            author_name: w.author_name.or(ref_name),
            rating: w.rating,
            comment: w.comment,
            created_at: w.created_at.unwrap_or_else(epoch),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest<'a> {
    pub product_id: &'a Id,
    pub rating: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

impl<'a> From<&'a NewReview> for ReviewRequest<'a> {
    fn from(r: &'a NewReview) -> Self {
        ReviewRequest {
            product_id: &r.product_id,
            rating: r.rating,
            comment: r.comment.as_deref(),
        }
    }
}

// =============================================================================
// Payments
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WirePayment {
    id: Id,
    #[serde(alias = "orderId")]
    order_id: Id,
    #[serde(deserialize_with = "lenient::money")]
    amount: Money,
    #[serde(default, alias = "paymentMethod", alias = "payment_method")]
    method: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::timestamp_opt")]
    created_at: Option<DateTime<Utc>>,
}

/// `bankTransfer`, `BANK_TRANSFER`, `bank-transfer` → `bank_transfer`.
fn snake(value: &str) -> String {
    if !value.chars().any(|c| c.is_ascii_lowercase()) {
        return value.to_ascii_lowercase().replace(['-', ' '], "_");
    }
    let mut out = String::with_capacity(value.len() + 4);
    for (i, ch) in value.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch == ' ' {
            out.push('_');
        } else {
            out.push(ch);
        }
    }
    out
}

impl TryFrom<WirePayment> for Payment {
    type Error = ApiError;

    fn try_from(w: WirePayment) -> Result<Self, Self::Error> {
        let method = match w.method.as_deref().map(snake).as_deref() {
            None | Some("card") | Some("credit_card") => PaymentMethod::Card,
            Some("bank_transfer") | Some("transfer") => PaymentMethod::BankTransfer,
            Some("cash") => PaymentMethod::Cash,
            Some(other) => {
                return Err(ApiError::Decode(format!("unknown payment method: {other}")))
            }
        };
        let status = match w.status.as_deref().map(snake).as_deref() {
            None | Some("pending") | Some("ready") => PaymentStatus::Pending,
            Some("paid") | Some("done") | Some("completed") => PaymentStatus::Paid,
            Some("failed") | Some("aborted") => PaymentStatus::Failed,
            Some("refunded") | Some("canceled") | Some("cancelled") => PaymentStatus::Refunded,
            Some(other) => {
                return Err(ApiError::Decode(format!("unknown payment status: {other}")))
            }
        };

        Ok(Payment {
            id: w.id,
            order_id: w.order_id,
            amount: w.amount,
            method,
            status,
            created_at: w.created_at.unwrap_or_else(epoch),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest<'a> {
    pub order_id: &'a Id,
    pub amount: Money,
    pub method: PaymentMethod,
}

impl<'a> From<&'a NewPayment> for PaymentRequest<'a> {
    fn from(p: &'a NewPayment) -> Self {
        PaymentRequest {
            order_id: &p.order_id,
            amount: p.amount,
            method: p.method,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        id: Id,
    }

    #[test]
    fn test_envelope_bare_or_wrapped() {
        let bare: Thing = decode_entity(r#"{"id": 1}"#).unwrap();
        let wrapped: Thing = decode_entity(r#"{"data": {"id": "1"}}"#).unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn test_list_envelope_shapes() {
        let shapes = [
            r#"[{"id": 1}, {"id": 2}]"#,
            r#"{"data": [{"id": 1}, {"id": 2}], "total": 2}"#,
            r#"{"items": [{"id": 1}, {"id": 2}], "total": 2, "page": 1}"#,
            r#"{"results": [{"id": 1}, {"id": 2}], "count": 2}"#,
            r#"{"data": {"items": [{"id": 1}, {"id": 2}], "total": 2}}"#,
        ];
        for shape in shapes {
            let page: Page<Thing> = decode_list(shape).unwrap();
            assert_eq!(page.items.len(), 2, "shape: {shape}");
            assert_eq!(page.items[1].id, Id::from(2));
        }

        let page: Page<Thing> = decode_list(shapes[2]).unwrap();
        assert_eq!(page.total, Some(2));
        assert_eq!(page.page, Some(1));
        let nested: Page<Thing> = decode_list(shapes[4]).unwrap();
        assert_eq!(nested.total, Some(2));
    }

    #[test]
    fn test_list_rejects_unknown_shape() {
        assert!(decode_list::<Thing>(r#"{"rows": []}"#).is_err());
    }

    #[test]
    fn test_product_camel_case_and_string_price() {
        let body = r#"{
            "id": 12,
            "name": "Sea Kayak",
            "pricePerDay": "70000.00",
            "stock": "3",
            "imageUrl": "https://cdn.example/kayak.jpg",
            "isActive": true,
            "category": {"id": 4, "name": "Water Sports"},
            "createdAt": "2024-05-01 09:00:00"
        }"#;
        let product: Product = decode_entity::<WireProduct>(body).unwrap().into();

        assert_eq!(product.id, Id::from(12));
        assert_eq!(product.price_per_day, Money::new(70_000));
        assert_eq!(product.stock, 3);
        assert_eq!(product.category_id, Some(Id::from(4)));
        assert_eq!(product.image_url.as_deref(), Some("https://cdn.example/kayak.jpg"));
        assert_eq!(product.created_at.to_rfc3339(), "2024-05-01T09:00:00+00:00");
        assert_eq!(product.updated_at, product.created_at);
    }

    #[test]
    fn test_product_snake_case() {
        let body = r#"{"data": {"id": "p-1", "name": "Tent", "price_per_day": 30000,
                        "category_id": "c-1", "is_active": false}}"#;
        let product: Product = decode_entity::<WireProduct>(body).unwrap().into();
        assert_eq!(product.category_id, Some(Id::new("c-1")));
        assert!(!product.is_active);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_auth_body_token_names() {
        for body in [
            r#"{"token": "abc"}"#,
            r#"{"accessToken": "abc", "refreshToken": "r"}"#,
            r#"{"data": {"access_token": "abc", "refresh_token": "r"}}"#,
        ] {
            let auth: AuthBody = decode_entity(body).unwrap();
            assert_eq!(auth.tokens().unwrap().access_token, "abc");
        }

        let auth: AuthBody =
            decode_entity(r#"{"token":"t","user":{"id":3,"email":"a@b.kr","role":"ADMIN"}}"#)
                .unwrap();
        let (tokens, user) = auth.into_parts();
        assert!(tokens.is_some());
        let user = user.unwrap();
        assert!(user.is_admin());
        assert_eq!(user.name, "a");
    }

    #[test]
    fn test_user_body_shapes() {
        for body in [
            r#"{"id": 1, "email": "kim@gearent.kr", "name": "Kim"}"#,
            r#"{"data": {"id": 1, "email": "kim@gearent.kr", "name": "Kim"}}"#,
            r#"{"user": {"id": "1", "email": "kim@gearent.kr", "username": "Kim"}}"#,
        ] {
            let user: User = serde_json::from_str::<UserBody>(body).unwrap().into();
            assert_eq!(user.id, Id::from(1));
            assert_eq!(user.name, "Kim");
        }
    }

    #[test]
    fn test_order_with_nested_lines() {
        let body = r#"{
            "id": 99,
            "userId": 7,
            "status": "CONFIRMED",
            "startDate": "2024-06-01T00:00:00Z",
            "orderItems": [
                {"product": {"id": 1, "name": "Bike"}, "price": 50000, "quantity": 2, "durationDays": 3},
                {"productId": 2, "productName": "Ball", "pricePerDay": 20000}
            ]
        }"#;
        let detail: OrderDetail = decode_entity::<WireOrder>(body).unwrap().try_into().unwrap();

        assert_eq!(detail.order.status, OrderStatus::Confirmed);
        assert_eq!(detail.order.user_id, Id::from(7));
        assert_eq!(
            detail.order.rental_start,
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].product_name, "Bike");
        assert_eq!(detail.items[0].id, Id::new("99-1"));
        assert_eq!(detail.items[1].quantity, 1);
        // no total on the wire → recomputed from lines
        assert_eq!(detail.order.total_amount, Money::new(320_000));
    }

    #[test]
    fn test_order_unknown_status_is_decode_error() {
        let result: Result<OrderDetail, _> =
            decode_entity::<WireOrder>(r#"{"id": 1, "status": "lost"}"#)
                .unwrap()
                .try_into();
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_address_aliases() {
        let body = r#"{"id": 5, "recipientName": "Kim", "phone": "010-1234-5678",
                       "address": "123 Teheran-ro", "addressDetail": "5F",
                       "zipCode": "06236", "isDefault": true}"#;
        let address: Address = decode_entity::<WireAddress>(body).unwrap().into();
        assert_eq!(address.line1, "123 Teheran-ro");
        assert_eq!(address.line2.as_deref(), Some("5F"));
        assert_eq!(address.postal_code, "06236");
        assert!(address.is_default);
    }

    #[test]
    fn test_review_author_from_nested_user() {
        let body = r#"{"id": 1, "productId": 12, "rating": 5, "content": "Great",
                       "user": {"id": 3, "name": "Lee"}}"#;
        let review: Review = decode_entity::<WireReview>(body).unwrap().into();
        assert_eq!(review.author_name.as_deref(), Some("Lee"));
        assert_eq!(review.user_id, Some(Id::from(3)));
        assert_eq!(review.comment.as_deref(), Some("Great"));
    }

    #[test]
    fn test_payment_method_and_status_spellings() {
        let body = r#"{"id": 1, "orderId": 99, "amount": 320000,
                       "paymentMethod": "bankTransfer", "status": "DONE"}"#;
        let payment: Payment = decode_entity::<WirePayment>(body)
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(payment.method, PaymentMethod::BankTransfer);
        assert_eq!(payment.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_requests_are_camel_case() {
        let order = NewOrder {
            items: vec![gearent_core::NewOrderLine {
                product_id: Id::from(1),
                quantity: 2,
                duration_days: 3,
            }],
            address_id: None,
            rental_start: None,
            total_amount: Money::new(300_000),
        };
        let json = serde_json::to_value(OrderRequest::from(&order)).unwrap();
        assert_eq!(json["items"][0]["productId"], "1");
        assert_eq!(json["items"][0]["durationDays"], 3);
        assert_eq!(json["totalAmount"], 300_000);
        assert!(json.get("addressId").is_none());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"message": "Out of stock"}"#), "Out of stock");
        assert_eq!(error_message(r#"{"error": {"message": "Bad token"}}"#), "Bad token");
        assert_eq!(error_message(r#"{"error": "Nope"}"#), "Nope");
        assert_eq!(error_message("Service Unavailable"), "Service Unavailable");
        assert_eq!(error_message(""), "no details");
    }
}
