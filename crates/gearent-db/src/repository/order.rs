//! # Order Repository
//!
//! Database operations for rental orders and their lines.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → Order { status: Pending } + OrderItem per line      │
//! │         (name and daily price frozen from the product row,             │
//! │          total recomputed from the frozen lines, one transaction)      │
//! │                                                                         │
//! │  2. ADMIN MOVES IT ALONG                                               │
//! │     └── update_status() → Confirmed → Renting → Returned               │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                  │
//! │     └── update_status(Cancelled) from Pending or Confirmed             │
//! │                                                                         │
//! │  Transition rules live in OrderStatus::can_transition_to; callers     │
//! │  check them before writing.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::{debug, info};

use super::product::PRODUCT_COLUMNS;
use super::{generate_id, now};
use crate::error::{DbError, DbResult};
use gearent_core::{Id, Money, NewOrder, Order, OrderDetail, OrderItem, OrderStatus, Product};

const ORDER_COLUMNS: &str =
    "id, user_id, status, total_amount, address_id, rental_start, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, price_per_day, quantity, duration_days";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates a pending order with one line per requested product.
    ///
    /// ## Returns
    /// * `Ok(OrderDetail)` - The stored order and its lines
    /// * `Err(DbError::NotFound)` - A line references an unknown product
    pub async fn create(&self, user_id: &Id, input: &NewOrder) -> DbResult<OrderDetail> {
        debug!(user_id = %user_id, lines = input.items.len(), "Creating order");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let now = now();
        let order_id = generate_id();
        let mut items = Vec::with_capacity(input.items.len());

        for line in &input.items {
            let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
            let product = sqlx::query_as::<_, Product>(&sql)
                .bind(&line.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Product", line.product_id.as_str()))?;

            items.push(OrderItem {
                id: generate_id(),
                order_id: order_id.clone(),
                product_id: product.id,
                product_name: product.name,
                price_per_day: product.price_per_day,
                quantity: line.quantity as i64,
                duration_days: line.duration_days as i64,
            });
        }

        let order = Order {
            id: order_id,
            user_id: user_id.clone(),
            status: OrderStatus::Pending,
            total_amount: items.iter().map(OrderItem::line_total).sum(),
            address_id: input.address_id.clone(),
            rental_start: input.rental_start,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, status, total_amount,
                address_id, rental_start, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.total_amount)
        .bind(&order.address_id)
        .bind(order.rental_start)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, product_name,
                    price_per_day, quantity, duration_days
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.price_per_day)
            .bind(item.quantity)
            .bind(item.duration_days)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = %order.id, total = %order.total_amount, "Order created");
        Ok(OrderDetail { order, items })
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &Id) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets an order together with its lines.
    pub async fn get_detail(&self, id: &Id) -> DbResult<Option<OrderDetail>> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let items = self.items_for(id).await?;
        Ok(Some(OrderDetail { order, items }))
    }

    /// Lines of one order, in insertion order.
    pub async fn items_for(&self, order_id: &Id) -> DbResult<Vec<OrderItem>> {
        let sql = format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY rowid"
        );
        let items = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Lists orders newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<OrderStatus>, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Lists one customer's orders, newest first.
    pub async fn list_for_user(&self, user_id: &Id) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Writes a new status. Callers validate the transition first.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The order after the update
    /// * `Err(DbError::NotFound)` - Order doesn't exist
    pub async fn update_status(&self, id: &Id, status: OrderStatus) -> DbResult<Order> {
        debug!(id = %id, status = %status, "Updating order status");

        let result = sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id.as_str()));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id.as_str()))
    }

    /// Counts all orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts orders in one status.
    pub async fn count_by_status(&self, status: OrderStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Sum of all order totals except cancelled ones.
    pub async fn revenue(&self) -> DbResult<Money> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status != 'cancelled'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::new(total))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
