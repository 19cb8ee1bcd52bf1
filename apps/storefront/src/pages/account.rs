//! Sign-in, sign-up, sign-out and the shopper's own orders.
//!
//! The booking store keeps the user snapshot and the token pair so a
//! restart picks the session back up (see `AppState::assemble`).

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::AppState;
use gearent_api::{ApiError, NewAccount, Registration, Session};
use gearent_core::validation::{validate_email, validate_password};
use gearent_core::{Id, OrderDetail, User, ValidationError};

/// Stores a fresh session in the booking store.
async fn remember(state: &AppState, session: &Session) -> AppResult<()> {
    let mut store = state.cart.lock().await;
    store.save_tokens(&session.tokens).await?;
    store.set_user(session.user.clone()).await?;
    Ok(())
}

/// Signs in. Returns the session user when the backend provided one.
pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<Option<User>> {
    validate_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::required("password").into());
    }

    let session = state.api.auth().login(email.trim(), password).await?;
    remember(state, &session).await?;
    state.cache.revalidate_prefix("/orders").await;

    info!(email = %email.trim(), "Shopper signed in");
    Ok(session.user)
}

/// Signs out locally no matter what the backend says.
pub async fn logout(state: &AppState) -> AppResult<()> {
    if let Err(e) = state.api.auth().logout().await {
        warn!(error = %e, "Backend logout failed");
    }

    state.cart.lock().await.logout().await?;
    state.cache.revalidate_prefix("/orders").await;
    info!("Shopper signed out");
    Ok(())
}

pub async fn register(state: &AppState, account: &NewAccount) -> AppResult<Registration> {
    validate_email(&account.email)?;
    validate_password(&account.password)?;
    if account.name.trim().is_empty() {
        return Err(ValidationError::required("name").into());
    }

    let registration = state.api.auth().register(account).await?;
    if let Some(session) = &registration.session {
        remember(state, session).await?;
        state.cache.revalidate_prefix("/orders").await;
    }
    Ok(registration)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersView {
    pub orders: Vec<OrderDetail>,
}

pub async fn my_orders(state: &AppState) -> AppResult<OrdersView> {
    // A cached list must not outlive the session that loaded it.
    if !state.api.is_authenticated().await {
        return Err(ApiError::MissingToken.into());
    }

    let loaded = state
        .cache
        .get_or_load("/orders", || async {
            let orders = state.api.orders().list().await?;
            Ok(OrdersView { orders })
        })
        .await;
    state.drop_rejected_session(loaded).await
}

/// Cancels one of the shopper's orders.
pub async fn cancel_order(state: &AppState, order_id: &Id) -> AppResult<OrderDetail> {
    let cancelled = state.api.orders().cancel(order_id).await;
    let detail = state.drop_rejected_session(cancelled.map_err(Into::into)).await?;
    state.cache.revalidate_prefix("/orders").await;
    Ok(detail)
}
