//! # Mutation Actions
//!
//! Admin writes against the catalog database. Each action validates its
//! input, performs one write, then drops the cached routes that show the
//! changed data.
//!
//! ## Revalidation Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product create/update/delete,      /  /products  /products/{id}       │
//! │  visibility, image upload           /admin/products                    │
//! │                                                                         │
//! │  category create/update/delete      /  /products  /admin/categories    │
//! │                                                                         │
//! │  order status                       /admin/orders  /admin  /orders     │
//! │                                                                         │
//! │  review delete                      /products/{product_id}             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missing target fails with `DbError::NotFound` and revalidates nothing.

use tracing::{info, warn};

use crate::cache::RouteCache;
use crate::error::AppResult;
use gearent_core::validation::{
    slugify, validate_new_category, validate_new_product, validate_price, validate_product_name,
    validate_stock,
};
use gearent_core::{
    Category, CoreError, Id, NewCategory, NewProduct, Order, OrderStatus, Product, ProductPatch,
    Review,
};
use gearent_db::{Database, DbError, ImageBucket};

pub struct Actions<'a> {
    db: &'a Database,
    cache: &'a RouteCache,
    bucket: &'a ImageBucket,
}

impl<'a> Actions<'a> {
    pub fn new(db: &'a Database, cache: &'a RouteCache, bucket: &'a ImageBucket) -> Self {
        Actions { db, cache, bucket }
    }

    async fn revalidate_product(&self, id: &Id) {
        self.cache.revalidate_path("/").await;
        self.cache.revalidate_path("/products").await;
        self.cache.revalidate_path(&format!("/products/{id}")).await;
        self.cache.revalidate_path("/admin/products").await;
    }

    async fn revalidate_categories(&self) {
        self.cache.revalidate_path("/").await;
        self.cache.revalidate_path("/products").await;
        self.cache.revalidate_path("/admin/categories").await;
    }

    async fn product(&self, id: &Id) -> AppResult<Product> {
        Ok(self
            .db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id.as_str()))?)
    }

    /// Removes the bucket file behind `image_url`, if it is one of ours.
    async fn discard_image(&self, image_url: Option<&str>) {
        let Some(key) = image_url.and_then(|url| self.bucket.key_from_url(url)) else {
            return;
        };
        if let Err(e) = self.bucket.remove(&key).await {
            warn!(key = %key, error = %e, "Could not remove old product image");
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn create_product(&self, input: &NewProduct) -> AppResult<Product> {
        validate_new_product(input)?;

        let product = self.db.products().insert(input).await?;
        info!(product_id = %product.id, name = %product.name, "Product created");

        self.revalidate_product(&product.id).await;
        Ok(product)
    }

    pub async fn update_product(&self, id: &Id, patch: &ProductPatch) -> AppResult<Product> {
        if let Some(name) = &patch.name {
            validate_product_name(name)?;
        }
        if let Some(price) = patch.price_per_day {
            validate_price(price)?;
        }
        if let Some(stock) = patch.stock {
            validate_stock(stock)?;
        }

        let product = self.db.products().update(id, patch).await?;
        info!(product_id = %id, "Product updated");

        self.revalidate_product(id).await;
        Ok(product)
    }

    /// Deletes the product, its reviews and its uploaded image.
    pub async fn delete_product(&self, id: &Id) -> AppResult<()> {
        let product = self.product(id).await?;

        self.db.products().delete(id).await?;
        self.discard_image(product.image_url.as_deref()).await;
        info!(product_id = %id, "Product deleted");

        self.revalidate_product(id).await;
        Ok(())
    }

    /// Shows or hides a product without deleting it.
    pub async fn set_product_active(&self, id: &Id, active: bool) -> AppResult<Product> {
        self.db.products().set_active(id, active).await?;
        info!(product_id = %id, active, "Product visibility changed");

        self.revalidate_product(id).await;
        self.product(id).await
    }

    /// Stores an image in the bucket and points the product at it. The
    /// previous image, if it came from the bucket, is removed.
    pub async fn upload_product_image(
        &self,
        id: &Id,
        file_name: &str,
        bytes: &[u8],
    ) -> AppResult<Product> {
        let product = self.product(id).await?;

        let stored = self.bucket.upload(id, file_name, bytes).await?;
        if let Err(e) = self
            .db
            .products()
            .set_image_url(id, Some(&stored.public_url))
            .await
        {
            self.discard_image(Some(&stored.public_url)).await;
            return Err(e.into());
        }
        self.discard_image(product.image_url.as_deref()).await;

        info!(product_id = %id, key = %stored.key, "Product image replaced");
        self.revalidate_product(id).await;
        self.product(id).await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// An empty slug is derived from the name.
    pub async fn create_category(&self, input: &NewCategory) -> AppResult<Category> {
        let input = with_slug(input);
        validate_new_category(&input)?;

        let category = self.db.categories().insert(&input).await?;
        info!(category_id = %category.id, slug = %category.slug, "Category created");

        self.revalidate_categories().await;
        Ok(category)
    }

    pub async fn update_category(&self, id: &Id, input: &NewCategory) -> AppResult<Category> {
        let input = with_slug(input);
        validate_new_category(&input)?;

        let category = self.db.categories().update(id, &input).await?;
        info!(category_id = %id, "Category updated");

        self.revalidate_categories().await;
        Ok(category)
    }

    /// Products of a deleted category stay, uncategorized.
    pub async fn delete_category(&self, id: &Id) -> AppResult<()> {
        self.db.categories().delete(id).await?;
        info!(category_id = %id, "Category deleted");

        self.revalidate_categories().await;
        Ok(())
    }

    // =========================================================================
    // Orders & Reviews
    // =========================================================================

    /// Moves an order along its lifecycle.
    ///
    /// ```text
    /// pending ──► confirmed ──► renting ──► returned
    ///    │            │
    ///    └────────────┴──► cancelled
    /// ```
    pub async fn update_order_status(&self, id: &Id, next: OrderStatus) -> AppResult<Order> {
        let order = self
            .db
            .orders()
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id.as_str()))?;

        if !order.status.can_transition_to(next) {
            return Err(CoreError::InvalidStatusTransition {
                order_id: id.to_string(),
                from: order.status.to_string(),
                to: next.to_string(),
            }
            .into());
        }

        let updated = self.db.orders().update_status(id, next).await?;
        info!(order_id = %id, from = %order.status, to = %next, "Order status changed");

        self.cache.revalidate_path("/admin/orders").await;
        self.cache.revalidate_path("/admin").await;
        self.cache.revalidate_prefix("/orders").await;
        Ok(updated)
    }

    pub async fn delete_review(&self, id: &Id) -> AppResult<Review> {
        let review = self.db.reviews().delete(id).await?;
        info!(review_id = %id, product_id = %review.product_id, "Review deleted");

        self.cache
            .revalidate_path(&format!("/products/{}", review.product_id))
            .await;
        Ok(review)
    }
}

fn with_slug(input: &NewCategory) -> NewCategory {
    let mut input = input.clone();
    if input.slug.trim().is_empty() {
        input.slug = slugify(&input.name);
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Outcome};
    use gearent_core::{Money, NewOrder, NewOrderLine, NewReview};
    use gearent_db::DbConfig;

    struct Fixture {
        db: Database,
        cache: RouteCache,
        bucket: ImageBucket,
        _dir: tempfile::TempDir,
    }

    impl Fixture {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            Fixture {
                db: Database::new(DbConfig::in_memory()).await.unwrap(),
                cache: RouteCache::new(None),
                bucket: ImageBucket::new(dir.path(), "http://img.test"),
                _dir: dir,
            }
        }

        fn actions(&self) -> Actions<'_> {
            Actions::new(&self.db, &self.cache, &self.bucket)
        }

        async fn warm(&self, paths: &[&str]) {
            for path in paths {
                self.cache
                    .get_or_load(path, || async { Ok(path.to_string()) })
                    .await
                    .unwrap();
            }
        }
    }

    fn bike() -> NewProduct {
        NewProduct {
            name: "Trek Marlin 5".into(),
            price_per_day: Money::new(50_000),
            stock: 4,
            ..NewProduct::default()
        }
    }

    #[tokio::test]
    async fn test_create_product_revalidates_catalog_routes() {
        let fx = Fixture::new().await;
        fx.warm(&["/", "/products", "/products?search=bike", "/admin/products", "/orders"])
            .await;

        let product = fx.actions().create_product(&bike()).await.unwrap();
        assert_eq!(product.name, "Trek Marlin 5");

        assert!(!fx.cache.contains("/").await);
        assert!(!fx.cache.contains("/products?search=bike").await);
        assert!(!fx.cache.contains("/admin/products").await);
        assert!(fx.cache.contains("/orders").await);
    }

    #[tokio::test]
    async fn test_create_product_rejects_invalid_input() {
        let fx = Fixture::new().await;
        fx.warm(&["/"]).await;

        let err = fx
            .actions()
            .create_product(&NewProduct {
                price_per_day: Money::new(-1),
                ..bike()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Core(CoreError::Validation(_))));
        assert!(fx.cache.contains("/").await);
        assert_eq!(fx.db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let fx = Fixture::new().await;
        let missing = Id::from("nope");

        let err = fx.actions().delete_product(&missing).await.unwrap_err();
        assert!(matches!(err, AppError::Db(DbError::NotFound { .. })));
        assert_eq!(err.outcome(), Outcome::alert("Product not found"));

        let err = fx
            .actions()
            .set_product_active(&missing, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Db(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_and_hide_product() {
        let fx = Fixture::new().await;
        let product = fx.actions().create_product(&bike()).await.unwrap();
        let page = format!("/products/{}", product.id);
        fx.warm(&[page.as_str()]).await;

        let updated = fx
            .actions()
            .update_product(
                &product.id,
                &ProductPatch {
                    price_per_day: Some(Money::new(45_000)),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_per_day, Money::new(45_000));
        assert!(!fx.cache.contains(&page).await);

        let hidden = fx
            .actions()
            .set_product_active(&product.id, false)
            .await
            .unwrap();
        assert!(!hidden.is_active);
        assert!(fx.db.products().list_newest(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_replaces_previous_image() {
        let fx = Fixture::new().await;
        let product = fx.actions().create_product(&bike()).await.unwrap();

        let first = fx
            .actions()
            .upload_product_image(&product.id, "bike.png", b"first")
            .await
            .unwrap();
        let first_url = first.image_url.clone().unwrap();
        assert!(first_url.starts_with("http://img.test/products/"));
        let first_key = fx.bucket.key_from_url(&first_url).unwrap();
        assert!(fx.bucket.root().join(&first_key).exists());

        let second = fx
            .actions()
            .upload_product_image(&product.id, "bike.jpg", b"second")
            .await
            .unwrap();
        assert_ne!(second.image_url, first.image_url);
        assert!(!fx.bucket.root().join(&first_key).exists());

        let err = fx
            .actions()
            .upload_product_image(&product.id, "notes.txt", b"text")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Db(DbError::InvalidUpload(_))));
    }

    #[tokio::test]
    async fn test_delete_product_removes_image() {
        let fx = Fixture::new().await;
        let product = fx.actions().create_product(&bike()).await.unwrap();
        let with_image = fx
            .actions()
            .upload_product_image(&product.id, "bike.png", b"png")
            .await
            .unwrap();
        let key = fx
            .bucket
            .key_from_url(with_image.image_url.as_deref().unwrap())
            .unwrap();

        fx.actions().delete_product(&product.id).await.unwrap();
        assert!(fx.db.products().get_by_id(&product.id).await.unwrap().is_none());
        assert!(!fx.bucket.root().join(key).exists());
    }

    #[tokio::test]
    async fn test_category_slug_derived_and_unique() {
        let fx = Fixture::new().await;
        fx.warm(&["/admin/categories", "/admin"]).await;

        let input = NewCategory {
            name: "Water Sports".into(),
            slug: String::new(),
            description: None,
        };
        let category = fx.actions().create_category(&input).await.unwrap();
        assert_eq!(category.slug, "water-sports");
        assert!(!fx.cache.contains("/admin/categories").await);
        assert!(fx.cache.contains("/admin").await);

        let err = fx.actions().create_category(&input).await.unwrap_err();
        assert!(matches!(err, AppError::Db(DbError::UniqueViolation { .. })));

        fx.actions().delete_category(&category.id).await.unwrap();
        assert_eq!(fx.db.categories().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_order_status_transitions() {
        let fx = Fixture::new().await;
        let product = fx.actions().create_product(&bike()).await.unwrap();
        let detail = fx
            .db
            .orders()
            .create(
                &Id::from(7),
                &NewOrder {
                    items: vec![NewOrderLine {
                        product_id: product.id.clone(),
                        quantity: 1,
                        duration_days: 2,
                    }],
                    address_id: None,
                    rental_start: None,
                    total_amount: Money::zero(),
                },
            )
            .await
            .unwrap();
        let id = detail.order.id;
        fx.warm(&["/admin", "/admin/orders", "/admin/products", "/orders", "/"]).await;

        let confirmed = fx
            .actions()
            .update_order_status(&id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert!(!fx.cache.contains("/admin").await);
        assert!(!fx.cache.contains("/admin/orders").await);
        assert!(!fx.cache.contains("/orders").await);
        assert!(fx.cache.contains("/admin/products").await);
        assert!(fx.cache.contains("/").await);

        let err = fx
            .actions()
            .update_order_status(&id, OrderStatus::Returned)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Core(CoreError::InvalidStatusTransition { .. })
        ));
        assert_eq!(
            fx.db.orders().get_by_id(&id).await.unwrap().unwrap().status,
            OrderStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_delete_review_revalidates_product_page() {
        let fx = Fixture::new().await;
        let product = fx.actions().create_product(&bike()).await.unwrap();
        let review = fx
            .db
            .reviews()
            .insert(
                &NewReview {
                    product_id: product.id.clone(),
                    rating: 2,
                    comment: Some("Flat tyre".into()),
                },
                None,
                Some("Choi Hyun"),
            )
            .await
            .unwrap();
        let page = format!("/products/{}", product.id);
        fx.warm(&[page.as_str(), "/products"]).await;

        let deleted = fx.actions().delete_review(&review.id).await.unwrap();
        assert_eq!(deleted.product_id, product.id);
        assert!(!fx.cache.contains(&page).await);
        assert!(fx.cache.contains("/products").await);

        let err = fx.actions().delete_review(&review.id).await.unwrap_err();
        assert!(matches!(err, AppError::Db(DbError::NotFound { .. })));
    }
}
