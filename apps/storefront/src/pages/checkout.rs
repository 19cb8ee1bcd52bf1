//! # Checkout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  signed in? ──no──► MissingToken (redirect to /login)                   │
//! │      │                                                                  │
//! │  lock cart ──empty──► EmptyCart                                         │
//! │      │                                                                  │
//! │  POST /api/orders    (lines + cart total)                               │
//! │      │                                                                  │
//! │  POST /api/payments  (order total)                                      │
//! │      │                                                                  │
//! │  clear cart, revalidate /orders                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart stays locked for the whole flow. If the payment fails the order
//! exists but the cart is kept, so the shopper can retry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::AppState;
use gearent_api::ApiError;
use gearent_core::validation::validate_payment_amount;
use gearent_core::{
    CoreError, Id, NewOrder, NewOrderLine, NewPayment, OrderDetail, Payment, PaymentMethod,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub address_id: Option<Id>,
    pub rental_start: Option<NaiveDate>,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order: OrderDetail,
    pub payment: Payment,
}

pub async fn checkout(state: &AppState, request: &CheckoutRequest) -> AppResult<CheckoutReceipt> {
    let placed = place_order(state, request).await;
    state.drop_rejected_session(placed).await
}

async fn place_order(state: &AppState, request: &CheckoutRequest) -> AppResult<CheckoutReceipt> {
    if !state.api.is_authenticated().await {
        return Err(ApiError::MissingToken.into());
    }

    let mut store = state.cart.lock().await;
    if store.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let summary = store.summary();
    let new_order = NewOrder {
        items: store
            .items()
            .iter()
            .map(|item| NewOrderLine {
                product_id: item.id.clone(),
                quantity: item.effective_quantity(),
                duration_days: item.effective_duration(),
            })
            .collect(),
        address_id: request.address_id.clone(),
        rental_start: request.rental_start,
        total_amount: summary.total,
    };

    let order = state.api.orders().create(&new_order).await?;
    state.cache.revalidate_prefix("/orders").await;

    let amount = order.order.total_amount;
    validate_payment_amount(amount)?;
    let payment = state
        .api
        .payments()
        .create(&NewPayment {
            order_id: order.order.id.clone(),
            amount,
            method: request.method,
        })
        .await
        .inspect_err(|e| {
            warn!(order_id = %order.order.id, error = %e, "Payment failed, cart kept");
        })?;

    store.clear_cart().await?;
    info!(
        order_id = %order.order.id,
        payment_id = %payment.id,
        total = %amount,
        "Checkout complete"
    );

    Ok(CheckoutReceipt { order, payment })
}
