//! # Category Repository
//!
//! Database operations for product categories.

use sqlx::SqlitePool;
use tracing::debug;

use super::{generate_id, now};
use crate::error::{DbError, DbResult};
use gearent_core::{Category, Id, NewCategory};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at";

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name");
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    /// Gets a category by ID.
    pub async fn get_by_id(&self, id: &Id) -> DbResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    /// Gets a category by its URL slug.
    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = ?1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Ok(Category)` - Inserted category with generated id
    /// * `Err(DbError::UniqueViolation)` - Slug already taken
    pub async fn insert(&self, input: &NewCategory) -> DbResult<Category> {
        debug!(slug = %input.slug, "Inserting category");

        let category = Category {
            id: generate_id(),
            name: input.name.trim().to_string(),
            slug: input.slug.clone(),
            description: input.description.clone(),
            created_at: now(),
        };

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &input.slug),
            other => other,
        })?;

        Ok(category)
    }

    /// Replaces a category's name, slug and description.
    pub async fn update(&self, id: &Id, input: &NewCategory) -> DbResult<Category> {
        debug!(id = %id, slug = %input.slug, "Updating category");

        let result = sqlx::query(
            r#"
            UPDATE categories SET
                name = ?2,
                slug = ?3,
                description = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.slug)
        .bind(&input.description)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &input.slug),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id.as_str()));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id.as_str()))
    }

    /// Deletes a category. Its products stay, uncategorized.
    pub async fn delete(&self, id: &Id) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id.as_str()));
        }

        Ok(())
    }

    /// Counts categories.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use gearent_core::{Money, NewProduct};

    use super::*;

    fn bikes() -> NewCategory {
        NewCategory {
            name: "Bikes".to_string(),
            slug: "bikes".to_string(),
            description: Some("Road and mountain bikes".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        let created = repo.insert(&bikes()).await.unwrap();
        assert_eq!(repo.get_by_id(&created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(repo.get_by_slug("bikes").await.unwrap(), Some(created));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        repo.insert(&bikes()).await.unwrap();
        let err = repo.insert(&bikes()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "bikes"));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        let created = repo.insert(&bikes()).await.unwrap();
        let mut input = bikes();
        input.name = "Cycling".to_string();
        input.slug = "cycling".to_string();
        let updated = repo.update(&created.id, &input).await.unwrap();
        assert_eq!(updated.slug, "cycling");

        let missing = Id::new("nope");
        assert!(repo.update(&missing, &input).await.unwrap_err().is_not_found());
        assert!(repo.delete(&missing).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_uncategorizes_products() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = db.categories().insert(&bikes()).await.unwrap();
        let product = db
            .products()
            .insert(&NewProduct {
                category_id: Some(category.id.clone()),
                name: "Trek Marlin 5".to_string(),
                price_per_day: Money::new(50_000),
                stock: 2,
                ..Default::default()
            })
            .await
            .unwrap();

        db.categories().delete(&category.id).await.unwrap();

        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.category_id, None);
    }
}
