//! # Product Repository
//!
//! Database operations for rentable products.
//!
//! ## Key Operations
//! - Storefront listings (newest, by category, search)
//! - Admin CRUD, including soft hide/show via `is_active`
//! - Stock adjustments
//!
//! ## Visibility
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Which listing sees what                              │
//! │                                                                         │
//! │  list_newest / list_by_category / search   → is_active = 1 only        │
//! │  list_all (admin table)                    → every row                 │
//! │  get_by_id                                 → every row (admin edit)    │
//! │                                                                         │
//! │  set_active(false) hides a product without breaking order history;    │
//! │  delete() removes the row and cascades its reviews.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use super::{generate_id, now};
use crate::error::{DbError, DbResult};
use gearent_core::{Id, NewProduct, Product, ProductPatch};

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, category_id, name, description, price_per_day, stock, image_url, is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let newest = repo.list_newest(8).await?;
/// let product = repo.get_by_id(&id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Newest active products first (home page shelf).
    pub async fn list_newest(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE is_active = 1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Every product, active or not, newest first (admin table).
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, rowid DESC"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Active products in one category, ordered by name.
    pub async fn list_by_category(&self, category_id: &Id, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE is_active = 1 AND category_id = ?1
             ORDER BY name
             LIMIT ?2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Searches active products by name or description.
    ///
    /// Case-insensitive substring match. An empty query returns the newest
    /// products instead.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let tents = repo.search("tent", 20).await?;
    /// ```
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_newest(limit).await;
        }

        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            r"SELECT {PRODUCT_COLUMNS} FROM products
              WHERE is_active = 1
                AND (name LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\')
              ORDER BY name
              LIMIT ?2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Gets a product by its ID, active or not.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &Id) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new, active product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown category
    pub async fn insert(&self, input: &NewProduct) -> DbResult<Product> {
        debug!(name = %input.name, "Inserting product");

        let now = now();
        let product = Product {
            id: generate_id(),
            category_id: input.category_id.clone(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            price_per_day: input.price_per_day,
            stock: input.stock,
            image_url: input.image_url.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, name, description,
                price_per_day, stock, image_url,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_per_day)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Applies a partial update. `None` fields keep their current value.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product after the update
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: &Id, patch: &ProductPatch) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                category_id = COALESCE(?2, category_id),
                name = COALESCE(?3, name),
                description = COALESCE(?4, description),
                price_per_day = COALESCE(?5, price_per_day),
                stock = COALESCE(?6, stock),
                image_url = COALESCE(?7, image_url),
                is_active = COALESCE(?8, is_active),
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.category_id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(&patch.description)
        .bind(patch.price_per_day)
        .bind(patch.stock)
        .bind(&patch.image_url)
        .bind(patch.is_active)
        .bind(now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id.as_str()));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id.as_str()))
    }

    /// Shows or hides a product on the storefront.
    pub async fn set_active(&self, id: &Id, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting product visibility");

        let result = sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id.as_str()));
        }

        Ok(())
    }

    /// Points a product at a new image (or clears it with `None`).
    pub async fn set_image_url(&self, id: &Id, image_url: Option<&str>) -> DbResult<()> {
        debug!(id = %id, image_url = ?image_url, "Setting product image");

        let result = sqlx::query("UPDATE products SET image_url = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(image_url)
            .bind(now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id.as_str()));
        }

        Ok(())
    }

    /// Adjusts stock by `delta` (negative when units go out on rent).
    ///
    /// Stock can't go below zero; the CHECK constraint rejects it with
    /// `DbError::QueryFailed`.
    pub async fn update_stock(&self, id: &Id, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Updating stock");

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id.as_str()));
        }

        Ok(())
    }

    /// Deletes a product and, by cascade, its reviews.
    pub async fn delete(&self, id: &Id) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id.as_str()));
        }

        Ok(())
    }

    /// Counts all products, active or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts products visible on the storefront.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use gearent_core::{Money, NewCategory};

    use super::*;

    fn gear(name: &str, price: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price_per_day: Money::new(price),
            stock: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("tent"), "tent");
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let created = repo.insert(&gear("Trek Marlin 5", 50_000)).await.unwrap();
        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(fetched, created);
        assert!(fetched.is_active);
        assert_eq!(fetched.price_per_day, Money::new(50_000));
    }

    #[tokio::test]
    async fn test_list_newest_hides_inactive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let tent = repo.insert(&gear("Dome Tent", 30_000)).await.unwrap();
        let kayak = repo.insert(&gear("Sea Kayak", 70_000)).await.unwrap();
        repo.set_active(&tent.id, false).await.unwrap();

        let newest = repo.list_newest(10).await.unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].id, kayak.id);

        assert_eq!(repo.list_all().await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_matches_name_and_description() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&gear("Dome Tent", 30_000)).await.unwrap();
        let mut stove = gear("Camp Stove", 10_000);
        stove.description = Some("Fits any TENT vestibule".to_string());
        repo.insert(&stove).await.unwrap();
        repo.insert(&gear("Road Bike", 50_000)).await.unwrap();

        let hits = repo.search("tent", 10).await.unwrap();
        assert_eq!(hits.len(), 2);

        assert!(repo.search("100%", 10).await.unwrap().is_empty());
        assert_eq!(repo.search("  ", 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let camping = db
            .categories()
            .insert(&NewCategory {
                name: "Camping".to_string(),
                slug: "camping".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let mut tent = gear("Dome Tent", 30_000);
        tent.category_id = Some(camping.id.clone());
        db.products().insert(&tent).await.unwrap();
        db.products().insert(&gear("Road Bike", 50_000)).await.unwrap();

        let listed = db.products().list_by_category(&camping.id, 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Dome Tent");
    }

    #[tokio::test]
    async fn test_patch_keeps_unset_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let created = repo.insert(&gear("Dome Tent", 30_000)).await.unwrap();

        let updated = repo
            .update(
                &created.id,
                &ProductPatch {
                    price_per_day: Some(Money::new(35_000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price_per_day, Money::new(35_000));
        assert_eq!(updated.name, "Dome Tent");
        assert_eq!(updated.stock, 3);
    }

    #[tokio::test]
    async fn test_stock_cannot_go_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let created = repo.insert(&gear("Dome Tent", 30_000)).await.unwrap();

        repo.update_stock(&created.id, -3).await.unwrap();
        assert!(repo.update_stock(&created.id, -1).await.is_err());

        let after = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 0);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let missing = Id::new("missing");

        assert!(repo.delete(&missing).await.unwrap_err().is_not_found());
        assert!(repo.set_active(&missing, true).await.unwrap_err().is_not_found());
        assert!(repo
            .update(&missing, &ProductPatch::default())
            .await
            .unwrap_err()
            .is_not_found());
    }
}
