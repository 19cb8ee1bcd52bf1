//! # Review Repository
//!
//! Database operations for product reviews.

use sqlx::SqlitePool;
use tracing::debug;

use super::{generate_id, now};
use crate::error::{DbError, DbResult};
use gearent_core::{Id, NewReview, Review};

const REVIEW_COLUMNS: &str = "id, product_id, user_id, author_name, rating, comment, created_at";

/// Repository for review database operations.
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    /// Creates a new ReviewRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReviewRepository { pool }
    }

    /// Reviews of one product, newest first.
    pub async fn list_for_product(&self, product_id: &Id) -> DbResult<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE product_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    /// Most recent reviews across the catalog (admin moderation list).
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    /// Gets a review by ID.
    pub async fn get_by_id(&self, id: &Id) -> DbResult<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1");
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(review)
    }

    /// Stores a review.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown product
    /// * `Err(DbError::QueryFailed)` - Rating outside 1..=5
    pub async fn insert(
        &self,
        input: &NewReview,
        user_id: Option<&Id>,
        author_name: Option<&str>,
    ) -> DbResult<Review> {
        debug!(product_id = %input.product_id, rating = input.rating, "Inserting review");

        let review = Review {
            id: generate_id(),
            product_id: input.product_id.clone(),
            user_id: user_id.cloned(),
            author_name: author_name.map(str::to_string),
            rating: input.rating,
            comment: input.comment.clone(),
            created_at: now(),
        };

        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, user_id, author_name, rating, comment, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&review.id)
        .bind(&review.product_id)
        .bind(&review.user_id)
        .bind(&review.author_name)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await?;

        Ok(review)
    }

    /// Deletes a review and returns it, so callers know which product page
    /// it was on.
    pub async fn delete(&self, id: &Id) -> DbResult<Review> {
        debug!(id = %id, "Deleting review");

        let sql = format!("DELETE FROM reviews WHERE id = ?1 RETURNING {REVIEW_COLUMNS}");
        sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Review", id.as_str()))
    }

    /// Counts all reviews.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
