//! Cart page and the "add to cart" button.
//!
//! The cart lives in the booking store only; nothing here touches the
//! catalog database. Adding by id fetches the product over REST first.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::AppState;
use gearent_core::validation::{validate_duration, validate_quantity};
use gearent_core::{CartItem, CartSummary, CoreError, Id, Product};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
    pub total_label: String,
}

/// Puts `product` in the cart for `quantity` units over `duration` days.
///
/// Returns `false` when the product was already in the cart; the existing
/// line is left as it was.
pub async fn add_to_cart(
    state: &AppState,
    product: &Product,
    quantity: u32,
    duration: u32,
) -> AppResult<bool> {
    validate_quantity(quantity)?;
    validate_duration(duration)?;

    if !product.can_rent(quantity) {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: if product.is_active { product.stock } else { 0 },
            requested: quantity as i64,
        }
        .into());
    }

    let mut store = state.cart.lock().await;
    if store.contains(&product.id) {
        debug!(product_id = %product.id, "Already in cart");
        return Ok(false);
    }

    store
        .add_item(CartItem::from_product(product, quantity, duration))
        .await?;
    info!(product_id = %product.id, quantity, duration, "Added to cart");
    Ok(true)
}

pub async fn add_to_cart_by_id(
    state: &AppState,
    product_id: &Id,
    quantity: u32,
    duration: u32,
) -> AppResult<bool> {
    let product = state.api.products().get(product_id).await?;
    add_to_cart(state, &product, quantity, duration).await
}

pub async fn cart_page(state: &AppState) -> AppResult<CartView> {
    let store = state.cart.lock().await;
    let summary = store.summary();
    Ok(CartView {
        items: store.items().to_vec(),
        total_label: state.config.format_price(summary.total),
        summary,
    })
}

pub async fn remove_from_cart(state: &AppState, product_id: &Id) -> AppResult<()> {
    state.cart.lock().await.remove_item(product_id).await?;
    debug!(product_id = %product_id, "Removed from cart");
    Ok(())
}

pub async fn clear_cart(state: &AppState) -> AppResult<()> {
    state.cart.lock().await.clear_cart().await?;
    debug!("Cart cleared");
    Ok(())
}
