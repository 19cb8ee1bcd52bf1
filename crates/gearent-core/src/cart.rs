//! # Cart Store
//!
//! The shopper's pending rental selection, persisted across reloads.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Booking Store Operations                             │
//! │                                                                         │
//! │  Shopper Action           Store Call              State Change          │
//! │  ──────────────           ──────────              ────────────          │
//! │                                                                         │
//! │  "Rent this" ────────────► add_item() ──────────► items.push(item)     │
//! │                            (no-op if id present)                        │
//! │                                                                         │
//! │  Click Remove ───────────► remove_item() ───────► items.retain(..)     │
//! │                                                                         │
//! │  Checkout done ──────────► clear_cart() ────────► items.clear()        │
//! │                                                                         │
//! │  Sign in / out ──────────► set_user() / logout() ► user, tokens        │
//! │                                                                         │
//! │  Every call above ends with persist(): the whole state is written to   │
//! │  storage under "booking-storage" before the call returns.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Shape
//! ```json
//! {
//!   "state": {
//!     "items": [{ "id": "1", "name": "Bike", "price": 50000, "quantity": 2, "duration": 3 }],
//!     "user": null
//!   },
//!   "version": 0
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::money::Money;
use crate::storage::{PersistEnvelope, StateStorage};
use crate::types::{AuthTokens, Id, Product, User};

/// Storage key of the persisted booking state.
pub const BOOKING_STORAGE_KEY: &str = "booking-storage";

/// Storage key of the cached access token.
pub const ACCESS_TOKEN_KEY: &str = "token";

/// Storage key of the cached refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Version written into the persistence envelope.
pub const STATE_VERSION: u32 = 0;

// =============================================================================
// Cart Item
// =============================================================================

/// One product selection pending checkout.
///
/// `quantity` and `duration` are optional on the wire; absent means 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Id,
    pub name: String,
    /// Daily rental price.
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// Rental length in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl CartItem {
    pub fn new(id: impl Into<Id>, name: impl Into<String>, price: Money) -> Self {
        CartItem {
            id: id.into(),
            name: name.into(),
            price,
            image: None,
            quantity: None,
            duration: None,
        }
    }

    /// Builds a cart line from a catalog product.
    pub fn from_product(product: &Product, quantity: u32, duration: u32) -> Self {
        CartItem {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price_per_day,
            image: product.image_url.clone(),
            quantity: Some(quantity),
            duration: Some(duration),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_duration(mut self, days: u32) -> Self {
        self.duration = Some(days);
        self
    }

    pub fn effective_quantity(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }

    pub fn effective_duration(&self) -> u32 {
        self.duration.unwrap_or(1)
    }

    /// price × quantity × days.
    pub fn line_total(&self) -> Money {
        self.price
            .rental_total(self.effective_quantity(), self.effective_duration())
    }
}

// =============================================================================
// Booking State
// =============================================================================

/// Everything the store persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingState {
    /// Insertion order; at most one entry per id.
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub user: Option<User>,
}

impl BookingState {
    /// Drops every entry whose id already appeared earlier in the list.
    fn dedupe(&mut self) -> usize {
        let before = self.items.len();
        let mut seen = HashSet::new();
        self.items.retain(|item| seen.insert(item.id.clone()));
        before - self.items.len()
    }
}

/// Cart totals for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub item_count: usize,
    pub total_quantity: u32,
    pub total: Money,
}

impl From<&BookingState> for CartSummary {
    fn from(state: &BookingState) -> Self {
        CartSummary {
            item_count: state.items.len(),
            total_quantity: state
                .items
                .iter()
                .map(CartItem::effective_quantity)
                .fold(0u32, u32::saturating_add),
            total: state.items.iter().map(CartItem::line_total).sum(),
        }
    }
}

// =============================================================================
// Booking Store
// =============================================================================

/// State container for the cart and signed-in user.
///
/// ## Invariants
/// - `items` never holds two entries with the same `id`
/// - every mutating call persists the full state before returning
///
/// ## Duplicate adds
/// Adding an id that is already in the cart is a silent no-op: the existing
/// entry keeps its quantity and duration. A shopper who changes the duration
/// of a product already in the cart has to remove it and add it again.
pub struct BookingStore {
    state: BookingState,
    storage: Arc<dyn StateStorage>,
}

impl std::fmt::Debug for BookingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl BookingStore {
    /// Builds a store and rehydrates it from `storage`.
    ///
    /// ## Rehydration
    /// - key absent → empty state
    /// - blob unreadable or written by another version → warn, empty state
    /// - duplicate ids in the blob → first occurrence kept
    ///
    /// Only a failing storage backend is reported as an error.
    pub async fn load(storage: Arc<dyn StateStorage>) -> StoreResult<Self> {
        let state = match storage.get_item(BOOKING_STORAGE_KEY).await? {
            Some(raw) => Self::rehydrate(&raw),
            None => BookingState::default(),
        };

        debug!(items = state.items.len(), signed_in = state.user.is_some(), "Booking store loaded");

        Ok(BookingStore { state, storage })
    }

    fn rehydrate(raw: &str) -> BookingState {
        let envelope: PersistEnvelope<BookingState> = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Persisted booking state is unreadable, starting empty");
                return BookingState::default();
            }
        };

        if envelope.version != STATE_VERSION {
            warn!(
                found = envelope.version,
                expected = STATE_VERSION,
                "Persisted booking state has a different version, starting empty"
            );
            return BookingState::default();
        }

        let mut state = envelope.state;
        let dropped = state.dedupe();
        if dropped > 0 {
            warn!(dropped, "Dropped duplicate cart entries from persisted state");
        }
        state
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn items(&self) -> &[CartItem] {
        &self.state.items
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.state.items.iter().any(|item| &item.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.state.items.is_empty()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary::from(&self.state)
    }

    // -------------------------------------------------------------------------
    // Cart mutations
    // -------------------------------------------------------------------------

    /// Appends `item` unless its id is already in the cart.
    pub async fn add_item(&mut self, item: CartItem) -> StoreResult<()> {
        if self.contains(&item.id) {
            debug!(id = %item.id, "Item already in cart, ignoring add");
        } else {
            debug!(id = %item.id, name = %item.name, "Adding item to cart");
            self.state.items.push(item);
        }
        self.persist().await
    }

    /// Removes the entry with `id`; absent ids are ignored.
    pub async fn remove_item(&mut self, id: &Id) -> StoreResult<()> {
        debug!(id = %id, "Removing item from cart");
        self.state.items.retain(|item| &item.id != id);
        self.persist().await
    }

    /// Empties the cart.
    pub async fn clear_cart(&mut self) -> StoreResult<()> {
        debug!(items = self.state.items.len(), "Clearing cart");
        self.state.items.clear();
        self.persist().await
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    /// Stores (or clears, with `None`) the signed-in user snapshot.
    pub async fn set_user(&mut self, user: Option<User>) -> StoreResult<()> {
        debug!(user = ?user.as_ref().map(|u| &u.email), "Setting user");
        self.state.user = user;
        self.persist().await
    }

    /// Caches bearer tokens next to the booking state.
    pub async fn save_tokens(&self, tokens: &AuthTokens) -> StoreResult<()> {
        self.storage
            .set_item(ACCESS_TOKEN_KEY, &tokens.access_token)
            .await?;
        match &tokens.refresh_token {
            Some(refresh) => self.storage.set_item(REFRESH_TOKEN_KEY, refresh).await,
            None => self.storage.remove_item(REFRESH_TOKEN_KEY).await,
        }
    }

    /// Reads the cached bearer tokens.
    pub async fn auth_tokens(&self) -> StoreResult<Option<AuthTokens>> {
        let Some(access_token) = self.storage.get_item(ACCESS_TOKEN_KEY).await? else {
            return Ok(None);
        };
        let refresh_token = self.storage.get_item(REFRESH_TOKEN_KEY).await?;
        Ok(Some(AuthTokens {
            access_token,
            refresh_token,
        }))
    }

    /// Clears the user snapshot and the cached tokens. The cart is kept.
    pub async fn logout(&mut self) -> StoreResult<()> {
        debug!("Logging out");
        self.state.user = None;
        self.storage.remove_item(ACCESS_TOKEN_KEY).await?;
        self.storage.remove_item(REFRESH_TOKEN_KEY).await?;
        self.persist().await
    }

    async fn persist(&self) -> StoreResult<()> {
        let envelope = PersistEnvelope {
            state: &self.state,
            version: STATE_VERSION,
        };
        let raw = serde_json::to_string(&envelope)?;
        self.storage.set_item(BOOKING_STORAGE_KEY, &raw).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::types::UserRole;

    fn bike() -> CartItem {
        CartItem::new(1, "Bike", Money::new(50_000))
            .with_quantity(2)
            .with_duration(3)
    }

    fn ball() -> CartItem {
        CartItem::new(2, "Ball", Money::new(20_000))
    }

    fn user() -> User {
        User {
            id: Id::from(9),
            email: "rider@gearent.kr".to_string(),
            name: "Rider".to_string(),
            role: UserRole::Customer,
            phone: None,
        }
    }

    async fn store_with(storage: &MemoryStorage) -> BookingStore {
        BookingStore::load(Arc::new(storage.clone())).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_two_items_then_readd_first() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage).await;

        store.add_item(bike()).await.unwrap();
        store.add_item(ball()).await.unwrap();
        assert_eq!(store.items().len(), 2);

        let changed = CartItem::new(1, "Bike (renamed)", Money::new(1))
            .with_quantity(9)
            .with_duration(9);
        store.add_item(changed).await.unwrap();

        assert_eq!(store.items().len(), 2);
        assert_eq!(store.items()[0], bike());
        assert_eq!(store.items()[1], ball());
    }

    #[tokio::test]
    async fn test_ids_stay_unique_for_any_add_sequence() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage).await;

        // Deterministic pseudo-random id stream with many repeats.
        let mut seed: u64 = 0x2545_f491;
        for _ in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let id = (seed >> 33) % 17;
            store
                .add_item(CartItem::new(id as i64, format!("item {}", id), Money::new(1000)))
                .await
                .unwrap();
        }

        let unique: HashSet<_> = store.items().iter().map(|i| i.id.clone()).collect();
        assert_eq!(unique.len(), store.items().len());
    }

    #[tokio::test]
    async fn test_number_and_string_ids_are_the_same_item() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage).await;

        store.add_item(CartItem::new(1, "Bike", Money::new(1))).await.unwrap();
        store.add_item(CartItem::new("1", "Bike", Money::new(1))).await.unwrap();
        assert_eq!(store.items().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage).await;

        store.remove_item(&Id::from(1)).await.unwrap();
        assert!(store.is_empty());

        store.add_item(bike()).await.unwrap();
        store.remove_item(&Id::from(42)).await.unwrap();
        assert_eq!(store.items(), &[bike()]);

        store.remove_item(&Id::from(1)).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cart_empties_items() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage).await;

        store.clear_cart().await.unwrap();
        assert_eq!(store.items().len(), 0);

        store.add_item(bike()).await.unwrap();
        store.add_item(ball()).await.unwrap();
        store.clear_cart().await.unwrap();
        assert_eq!(store.items().len(), 0);
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let storage = MemoryStorage::new();
        {
            let mut store = store_with(&storage).await;
            store.add_item(bike()).await.unwrap();
            store.set_user(Some(user())).await.unwrap();
        }

        let reloaded = store_with(&storage).await;
        assert_eq!(reloaded.items(), &[bike()]);
        assert_eq!(reloaded.user(), Some(&user()));
    }

    #[tokio::test]
    async fn test_persisted_envelope_shape() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage).await;
        store.add_item(ball()).await.unwrap();

        let raw = storage.get_item(BOOKING_STORAGE_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["items"][0]["price"], 20_000);
        assert_eq!(value["state"]["items"][0]["id"], "2");
        assert!(value["state"]["items"][0].get("quantity").is_none());
        assert!(value["state"]["user"].is_null());
    }

    #[tokio::test]
    async fn test_rehydrates_blob_with_numeric_ids() {
        let storage = MemoryStorage::new();
        let blob = r#"{"state":{"items":[
            {"id":1,"name":"Bike","price":50000,"quantity":2,"duration":3},
            {"id":1,"name":"Bike again","price":1},
            {"id":2,"name":"Ball","price":20000}
        ],"user":null},"version":0}"#;
        storage.set_item(BOOKING_STORAGE_KEY, blob).await.unwrap();

        let store = store_with(&storage).await;
        assert_eq!(store.items(), &[bike(), ball()]);
    }

    #[tokio::test]
    async fn test_corrupt_or_foreign_version_starts_empty() {
        let storage = MemoryStorage::new();
        storage.set_item(BOOKING_STORAGE_KEY, "{not json").await.unwrap();
        assert!(store_with(&storage).await.is_empty());

        let other_version = r#"{"state":{"items":[{"id":1,"name":"x","price":1}]},"version":3}"#;
        storage.set_item(BOOKING_STORAGE_KEY, other_version).await.unwrap();
        assert!(store_with(&storage).await.is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_user_and_tokens_but_keeps_cart() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage).await;

        store.add_item(bike()).await.unwrap();
        store.set_user(Some(user())).await.unwrap();
        store
            .save_tokens(&AuthTokens {
                access_token: "access".to_string(),
                refresh_token: Some("refresh".to_string()),
            })
            .await
            .unwrap();
        assert!(store.auth_tokens().await.unwrap().is_some());

        store.logout().await.unwrap();

        assert!(store.user().is_none());
        assert!(store.auth_tokens().await.unwrap().is_none());
        assert_eq!(storage.get_item(REFRESH_TOKEN_KEY).await.unwrap(), None);
        assert_eq!(store.items().len(), 1);

        let reloaded = store_with(&storage).await;
        assert!(reloaded.user().is_none());
    }

    #[tokio::test]
    async fn test_summary() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage).await;
        store.add_item(bike()).await.unwrap();
        store.add_item(ball()).await.unwrap();

        let summary = store.summary();
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.total_quantity, 3);
        // 50,000 × 2 × 3 + 20,000 × 1 × 1
        assert_eq!(summary.total.amount(), 320_000);
    }

    #[tokio::test]
    async fn test_summary_saturates_on_huge_lines() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage).await;
        let price = Money::new(i64::MAX / 2 + 1);
        store.add_item(CartItem::new(1, "Yacht", price)).await.unwrap();
        store.add_item(CartItem::new(2, "Other yacht", price)).await.unwrap();

        assert_eq!(store.summary().total.amount(), i64::MAX);
    }

    #[tokio::test]
    async fn test_summary_of_extreme_persisted_blob() {
        let storage = MemoryStorage::new();
        let blob = r#"{"state":{"items":[
            {"id":1,"name":"A","price":9223372036854775807,"quantity":4000000000},
            {"id":2,"name":"B","price":9223372036854775807,"quantity":4000000000}
        ],"user":null},"version":0}"#;
        storage.set_item(BOOKING_STORAGE_KEY, blob).await.unwrap();

        let summary = store_with(&storage).await.summary();
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.total_quantity, u32::MAX);
        assert_eq!(summary.total.amount(), i64::MAX);
    }
}
