//! # Catalog Database Handle
//!
//! One SQLite file holds two things for the storefront: the rental catalog
//! (products, categories, orders, reviews) that the home page and the admin
//! console read, and the `local_storage` key/value table where the booking
//! store persists the cart and the session tokens.
//!
//! ```text
//! AppState::open
//!   └─ Database::new(DbConfig::new(config.database_path))
//!        ├─ migrations 001..  (catalog tables + local_storage)
//!        ├─ db.products() / categories() / orders() / reviews()
//!        │     home page, admin dashboard, admin writes
//!        └─ db.local_storage()  →  SqliteStorage
//!              "booking-storage", "token", "refreshToken"
//! ```
//!
//! WAL journaling lets a page load read while an admin action writes.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::category::CategoryRepository;
use crate::repository::kv::SqliteStorage;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::repository::review::ReviewRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the catalog file lives and how its pool is sized.
///
/// The storefront takes the path from `database_path` in its config file
/// and keeps every other default.
///
/// ```rust,ignore
/// let config = DbConfig::new("./data/gearent.db").max_connections(2);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file with the catalog and the cart's key/value rows.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Create or upgrade the catalog and `local_storage` tables on
    /// connect. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Defaults for a file at `path`. The file is created on first connect;
    /// its directory must already exist (`AppState::open` makes it).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// A private catalog that vanishes with the pool. Page and action tests
    /// seed products and orders into it; the cart usually sits in a
    /// `MemoryStorage` instead of its `local_storage` table.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            // Each connection to ":memory:" would see its own empty database
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Cloneable handle to the catalog file. Repositories borrow its pool.
///
/// Catalog reads (home page, admin pages) and admin writes go through the
/// typed repositories; the booking store reaches the same file through
/// [`Database::local_storage`].
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./gearent.db")).await?;
/// let newest = db.products().list_newest(8).await?;
/// let cart_storage: Arc<dyn StateStorage> = Arc::new(db.local_storage());
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the catalog file in WAL mode with foreign keys
    /// on, then applies pending migrations unless `run_migrations` is off.
    ///
    /// ## Errors
    /// `ConnectionFailed` if the file can't be opened, `MigrationFailed` if
    /// the schema can't be brought up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening catalog database"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Off by default in SQLite; ON DELETE CASCADE for reviews needs it
            .foreign_keys(true)
            .create_if_missing(true);


        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Catalog pool ready"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Brings the catalog and `local_storage` tables up to the latest
    /// schema. Already-applied versions are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        debug!("Catalog schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Products, including hidden ones for the admin console.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    /// Orders as the admin console sees them (all shoppers).
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn reviews(&self) -> ReviewRepository {
        ReviewRepository::new(self.pool.clone())
    }

    /// The `local_storage` table, as the booking store's persistence
    /// backend. Shares the pool with the catalog repositories.
    pub fn local_storage(&self) -> SqliteStorage {
        SqliteStorage::new(self.pool.clone())
    }

    /// Waits for in-flight queries, then closes every connection. The CLI
    /// calls this once the command has finished.
    pub async fn close(&self) {
        debug!("Closing catalog pool");
        self.pool.close().await;
    }

    /// `true` while the catalog answers `SELECT 1`.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use gearent_core::StateStorage;

    #[tokio::test]
    async fn test_in_memory_catalog_starts_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.products().count().await.unwrap(), 0);
        assert_eq!(db.local_storage().get_item("booking-storage").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_skipping_migrations_leaves_no_tables() {
        let config = DbConfig::new(":memory:")
            .max_connections(1)
            .run_migrations(false);
        assert_eq!(config.min_connections, 1);

        let db = Database::new(config).await.unwrap();
        assert!(db.health_check().await);
        assert!(db.categories().list().await.is_err());
    }

    #[tokio::test]
    async fn test_cart_rows_share_the_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gearent.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.local_storage().set_item("token", "abc").await.unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(
            reopened.local_storage().get_item("token").await.unwrap().as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn test_file_database_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gearent.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.categories()
            .insert(&gearent_core::NewCategory {
                name: "Bikes".to_string(),
                slug: "bikes".to_string(),
                description: None,
            })
            .await
            .unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(reopened.categories().list().await.unwrap().len(), 1);
    }
}
