//! # GeaRent Storefront
//!
//! Orchestration layer for the rental storefront and its admin console:
//! page view models, mutation actions, the route cache, and the CLI front
//! end in `main.rs`.
//!
//! ## Module Organization
//! ```text
//! storefront/
//! ├── lib.rs          ◄─── You are here (AppState, tracing setup)
//! ├── config.rs       ◄─── StorefrontConfig (file, env, defaults)
//! ├── error.rs        ◄─── AppError and the user-facing Outcome
//! ├── cache.rs        ◄─── RouteCache (path → cached view model)
//! ├── actions.rs      ◄─── Admin writes + route revalidation
//! ├── pages/          ◄─── Page loaders (catalog, cart, checkout, ...)
//! └── main.rs         ◄─── clap CLI
//! ```
//!
//! ## Shared State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            AppState                                     │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌───────────────────────────────┐   │
//! │  │  Database    │ │  ApiClient   │ │  Arc<Mutex<BookingStore>>     │   │
//! │  │  (catalog)   │ │  (REST)      │ │  cart + user, persisted under │   │
//! │  │              │ │  bearer token│ │  "booking-storage"            │   │
//! │  └──────────────┘ └──────────────┘ └───────────────────────────────┘   │
//! │  ┌──────────────┐ ┌──────────────┐ ┌───────────────────────────────┐   │
//! │  │  RouteCache  │ │ ImageBucket  │ │  StorefrontConfig             │   │
//! │  └──────────────┘ └──────────────┘ └───────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod actions;
pub mod cache;
pub mod config;
pub mod error;
pub mod pages;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use actions::Actions;
use cache::RouteCache;
use config::StorefrontConfig;
use error::AppResult;
use gearent_api::{ApiClient, ApiError};
use gearent_core::{BookingStore, StateStorage};
use gearent_db::{Database, DbConfig, DbError, ImageBucket};

pub use error::{AppError, Outcome};

/// Everything pages and actions need.
pub struct AppState {
    pub config: StorefrontConfig,
    pub db: Database,
    pub api: ApiClient,
    /// Single writer for the cart; every mutation goes through the lock.
    pub cart: Arc<Mutex<BookingStore>>,
    pub cache: RouteCache,
    pub bucket: ImageBucket,
}

impl AppState {
    /// Opens the catalog database and REST client from `config`. The cart
    /// store persists into the database's `local_storage` table.
    ///
    /// ## Startup Sequence
    /// 1. Create the database directory, connect, run migrations
    /// 2. Build the REST client
    /// 3. Rehydrate the cart store, restore a cached access token
    pub async fn open(config: StorefrontConfig) -> AppResult<Self> {
        if let Some(parent) = config
            .database_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent).map_err(DbError::from)?;
        }

        let db = Database::new(DbConfig::new(config.database_path.clone())).await?;
        info!(path = %config.database_path.display(), "Catalog database ready");

        let api = ApiClient::new(config.api_base_url.clone(), config.api_timeout())?;
        let storage: Arc<dyn StateStorage> = Arc::new(db.local_storage());

        Self::assemble(config, db, api, storage).await
    }

    /// Wires already-built parts together.
    pub async fn assemble(
        config: StorefrontConfig,
        db: Database,
        api: ApiClient,
        storage: Arc<dyn StateStorage>,
    ) -> AppResult<Self> {
        let store = BookingStore::load(storage).await?;

        if let Some(tokens) = store.auth_tokens().await? {
            debug!("Restored cached access token");
            api.set_token(Some(tokens.access_token)).await;
        }

        let cache = RouteCache::new(config.route_cache_ttl());
        let bucket = ImageBucket::new(config.image_dir.clone(), config.image_public_url.clone());

        Ok(AppState {
            config,
            db,
            api,
            cart: Arc::new(Mutex::new(store)),
            cache,
            bucket,
        })
    }

    /// Passes `result` through. A 401 from the backend also signs the
    /// shopper out locally so the dead token isn't sent again or restored
    /// on the next start. The cart is kept.
    pub async fn drop_rejected_session<T>(&self, result: AppResult<T>) -> AppResult<T> {
        if let Err(AppError::Api(ApiError::Unauthorized(reason))) = &result {
            warn!(reason = %reason, "Backend rejected the access token, signing out");
            self.api.set_token(None).await;
            self.cart.lock().await.logout().await?;
            self.cache.revalidate_prefix("/orders").await;
        }
        result
    }

    pub fn actions(&self) -> Actions<'_> {
        Actions::new(&self.db, &self.cache, &self.bucket)
    }
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `default_level` (from config) with sqlx
/// quieted down.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},sqlx=warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
