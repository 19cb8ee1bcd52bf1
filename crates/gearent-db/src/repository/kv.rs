//! # Local Storage Table
//!
//! `local_storage(key, value, updated_at)` as a [`StateStorage`] backend, so
//! the cart store survives process restarts.
//!
//! ```text
//! BookingStore ──set_item("booking-storage", json)──► INSERT ... ON CONFLICT(key) DO UPDATE
//! ```
//!
//! Last writer wins; there is no compare-and-swap.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use super::now;
use crate::error::DbError;
use gearent_core::error::{StoreError, StoreResult};
use gearent_core::StateStorage;

/// Cart store storage backed by the catalog database.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStorage { pool }
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Result<Vec<String>, DbError> {
        let keys = sqlx::query_scalar("SELECT key FROM local_storage ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }
}

fn storage_error(err: sqlx::Error) -> StoreError {
    StoreError::Storage(DbError::from(err).to_string())
}

#[async_trait]
impl StateStorage for SqliteStorage {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        sqlx::query_scalar("SELECT value FROM local_storage WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)
    }

    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        debug!(key, bytes = value.len(), "Writing local storage");

        sqlx::query(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(())
    }
}
