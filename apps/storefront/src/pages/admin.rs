//! Admin console pages. All reads go to the catalog database.
//!
//! Writes live in [`crate::actions`]; they revalidate the routes cached
//! here.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppResult;
use crate::AppState;
use gearent_core::{Category, Money, Order, OrderStatus, Product, Review};

/// Rows in the dashboard's "recent" panels.
pub const RECENT_LIMIT: u32 = 5;

/// Rows on the admin orders page.
pub const ORDERS_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub product_count: i64,
    pub active_product_count: i64,
    pub category_count: i64,
    pub order_count: i64,
    pub pending_orders: i64,
    /// Total of every order that wasn't cancelled.
    pub revenue: Money,
    pub revenue_label: String,
    pub recent_orders: Vec<Order>,
    pub recent_reviews: Vec<Review>,
}

pub async fn admin_dashboard(state: &AppState) -> AppResult<DashboardView> {
    state
        .cache
        .get_or_load("/admin", || async {
            let products = state.db.products();
            let orders = state.db.orders();

            let revenue = orders.revenue().await?;
            let view = DashboardView {
                product_count: products.count().await?,
                active_product_count: products.count_active().await?,
                category_count: state.db.categories().count().await?,
                order_count: orders.count().await?,
                pending_orders: orders.count_by_status(OrderStatus::Pending).await?,
                revenue,
                revenue_label: state.config.format_price(revenue),
                recent_orders: orders.list(None, RECENT_LIMIT).await?,
                recent_reviews: state.db.reviews().list_recent(RECENT_LIMIT).await?,
            };
            debug!(orders = view.order_count, revenue = %view.revenue, "Dashboard loaded");
            Ok(view)
        })
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminOrdersView {
    pub status: Option<OrderStatus>,
    pub orders: Vec<Order>,
}

pub async fn admin_orders(
    state: &AppState,
    status: Option<OrderStatus>,
) -> AppResult<AdminOrdersView> {
    let path = match status {
        Some(status) => format!("/admin/orders?status={status}"),
        None => "/admin/orders".to_string(),
    };

    state
        .cache
        .get_or_load(&path, || async {
            let orders = state.db.orders().list(status, ORDERS_PAGE_LIMIT).await?;
            Ok(AdminOrdersView { status, orders })
        })
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProductsView {
    /// Hidden products included.
    pub products: Vec<Product>,
}

pub async fn admin_products(state: &AppState) -> AppResult<AdminProductsView> {
    state
        .cache
        .get_or_load("/admin/products", || async {
            Ok(AdminProductsView {
                products: state.db.products().list_all().await?,
            })
        })
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCategoriesView {
    pub categories: Vec<Category>,
}

pub async fn admin_categories(state: &AppState) -> AppResult<AdminCategoriesView> {
    state
        .cache
        .get_or_load("/admin/categories", || async {
            Ok(AdminCategoriesView {
                categories: state.db.categories().list().await?,
            })
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::state;
    use gearent_core::{Id, NewOrder, NewOrderLine, NewProduct, NewReview};

    async fn seed(state: &AppState) -> (Product, Product) {
        let products = state.db.products();
        let bike = products
            .insert(&NewProduct {
                name: "Mountain Bike".into(),
                price_per_day: Money::new(50_000),
                stock: 4,
                ..NewProduct::default()
            })
            .await
            .unwrap();
        let kayak = products
            .insert(&NewProduct {
                name: "Kayak".into(),
                price_per_day: Money::new(40_000),
                stock: 2,
                ..NewProduct::default()
            })
            .await
            .unwrap();
        (bike, kayak)
    }

    fn one_line(product: &Product, days: u32) -> NewOrder {
        NewOrder {
            items: vec![NewOrderLine {
                product_id: product.id.clone(),
                quantity: 1,
                duration_days: days,
            }],
            address_id: None,
            rental_start: None,
            total_amount: Money::zero(),
        }
    }

    #[tokio::test]
    async fn test_dashboard_counts_and_revenue() {
        let state = state("http://127.0.0.1:9").await;
        let (bike, kayak) = seed(&state).await;
        state.db.products().set_active(&kayak.id, false).await.unwrap();

        let user = Id::from(5);
        let orders = state.db.orders();
        orders.create(&user, &one_line(&bike, 2)).await.unwrap();
        let cancelled = orders.create(&user, &one_line(&kayak, 1)).await.unwrap();
        orders
            .update_status(&cancelled.order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        state
            .db
            .reviews()
            .insert(
                &NewReview {
                    product_id: bike.id.clone(),
                    rating: 5,
                    comment: Some("Smooth ride".into()),
                },
                Some(&user),
                Some("Kim"),
            )
            .await
            .unwrap();

        let view = admin_dashboard(&state).await.unwrap();
        assert_eq!(view.product_count, 2);
        assert_eq!(view.active_product_count, 1);
        assert_eq!(view.order_count, 2);
        assert_eq!(view.pending_orders, 1);
        assert_eq!(view.revenue, Money::new(100_000));
        assert_eq!(view.revenue_label, "₩100,000");
        assert_eq!(view.recent_orders.len(), 2);
        assert_eq!(view.recent_reviews.len(), 1);
        assert!(state.cache.contains("/admin").await);
    }

    #[tokio::test]
    async fn test_admin_orders_filter() {
        let state = state("http://127.0.0.1:9").await;
        let (bike, kayak) = seed(&state).await;
        let user = Id::from(5);
        let orders = state.db.orders();
        orders.create(&user, &one_line(&bike, 1)).await.unwrap();
        let confirmed = orders.create(&user, &one_line(&kayak, 1)).await.unwrap();
        orders
            .update_status(&confirmed.order.id, OrderStatus::Confirmed)
            .await
            .unwrap();

        let all = admin_orders(&state, None).await.unwrap();
        assert_eq!(all.orders.len(), 2);

        let pending = admin_orders(&state, Some(OrderStatus::Pending)).await.unwrap();
        assert_eq!(pending.status, Some(OrderStatus::Pending));
        assert_eq!(pending.orders.len(), 1);
        assert!(state.cache.contains("/admin/orders?status=pending").await);

        // One revalidation drops every filter variant.
        assert_eq!(state.cache.revalidate_path("/admin/orders").await, 2);
    }

    #[tokio::test]
    async fn test_admin_products_include_hidden() {
        let state = state("http://127.0.0.1:9").await;
        let (_, kayak) = seed(&state).await;
        state.db.products().set_active(&kayak.id, false).await.unwrap();

        let view = admin_products(&state).await.unwrap();
        assert_eq!(view.products.len(), 2);
        assert!(admin_categories(&state).await.unwrap().categories.is_empty());
    }
}
