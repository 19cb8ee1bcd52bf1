//! # Route Cache
//!
//! Rendered page view models keyed by route path. Mutation actions drop the
//! routes whose data they changed; the next visit reloads.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get_or_load("/products?search=tent", loader)                          │
//! │       │                                                                 │
//! │       ├── fresh entry? ───────────────► decode and return              │
//! │       └── missing / expired ──► loader() ──► store JSON ──► return     │
//! │                                                                         │
//! │  revalidate_path("/products")    drops /products and /products?…       │
//! │  revalidate_prefix("/admin")     drops /admin, /admin/orders, …        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Views are stored as `serde_json::Value`, so one cache holds every page
//! type. Clones share the same entries.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::AppResult;

#[derive(Debug, Clone)]
struct CachedView {
    value: serde_json::Value,
    stored_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct RouteCache {
    entries: Arc<RwLock<HashMap<String, CachedView>>>,
    ttl: Option<Duration>,
}

/// `products/` → `/products`; the query string is kept.
fn normalize(path: &str) -> String {
    let path = path.trim();
    let (route, query) = match path.split_once('?') {
        Some((route, query)) => (route, Some(query)),
        None => (path, None),
    };

    let mut route = format!("/{}", route.trim_matches('/'));
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        route.push('?');
        route.push_str(query);
    }
    route
}

fn route_of(key: &str) -> &str {
    key.split_once('?').map_or(key, |(route, _)| route)
}

impl RouteCache {
    /// `ttl = None` keeps entries until they are revalidated.
    pub fn new(ttl: Option<Duration>) -> Self {
        RouteCache {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    fn is_fresh(&self, view: &CachedView) -> bool {
        self.ttl.map_or(true, |ttl| view.stored_at.elapsed() < ttl)
    }

    /// Returns the cached view for `path`, or runs `loader` and caches its
    /// result. Loader errors are returned and nothing is stored.
    pub async fn get_or_load<T, F, Fut>(&self, path: &str, loader: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let key = normalize(path);

        let cached = {
            let entries = self.entries.read().await;
            entries
                .get(&key)
                .filter(|view| self.is_fresh(view))
                .map(|view| view.value.clone())
        };

        if let Some(value) = cached {
            match serde_json::from_value::<T>(value) {
                Ok(view) => {
                    debug!(path = %key, "Route cache hit");
                    return Ok(view);
                }
                Err(e) => warn!(path = %key, error = %e, "Cached view has another shape, reloading"),
            }
        }

        debug!(path = %key, "Route cache miss");
        let view = loader().await?;
        let value = serde_json::to_value(&view)?;
        self.entries.write().await.insert(
            key,
            CachedView {
                value,
                stored_at: Instant::now(),
            },
        );
        Ok(view)
    }

    pub async fn contains(&self, path: &str) -> bool {
        let key = normalize(path);
        self.entries
            .read()
            .await
            .get(&key)
            .is_some_and(|view| self.is_fresh(view))
    }

    /// Drops the entry for `path`, including every query-string variant.
    pub async fn revalidate_path(&self, path: &str) -> usize {
        let target = normalize(path);
        let route = route_of(&target).to_string();

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| route_of(key) != route);
        let dropped = before - entries.len();

        debug!(path = %route, dropped, "Revalidated path");
        dropped
    }

    /// Drops `prefix` and every route beneath it.
    pub async fn revalidate_prefix(&self, prefix: &str) -> usize {
        let target = normalize(prefix);
        let base = route_of(&target).trim_end_matches('/').to_string();
        let nested = format!("{base}/");

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| {
            let route = route_of(key);
            !(route == base || route.starts_with(&nested))
        });
        let dropped = before - entries.len();

        debug!(prefix = %base, dropped, "Revalidated prefix");
        dropped
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use gearent_core::CoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn load(cache: &RouteCache, path: &str, calls: &AtomicUsize) -> Vec<String> {
        cache
            .get_or_load(path, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![path.to_string()])
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("products/"), "/products");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("/products?search=tent"), "/products?search=tent");
        assert_eq!(normalize("/products?"), "/products");
    }

    #[tokio::test]
    async fn test_second_load_is_cached() {
        let cache = RouteCache::new(None);
        let calls = AtomicUsize::new(0);

        assert_eq!(load(&cache, "/products", &calls).await, vec!["/products"]);
        assert_eq!(load(&cache, "/products/", &calls).await, vec!["/products"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_revalidate_path_drops_query_variants() {
        let cache = RouteCache::new(None);
        let calls = AtomicUsize::new(0);
        load(&cache, "/products", &calls).await;
        load(&cache, "/products?search=tent", &calls).await;
        load(&cache, "/products/4", &calls).await;

        assert_eq!(cache.revalidate_path("/products").await, 2);
        assert!(!cache.contains("/products?search=tent").await);
        assert!(cache.contains("/products/4").await);
    }

    #[tokio::test]
    async fn test_revalidate_prefix() {
        let cache = RouteCache::new(None);
        let calls = AtomicUsize::new(0);
        for path in ["/admin", "/admin/orders", "/administrator", "/"] {
            load(&cache, path, &calls).await;
        }

        assert_eq!(cache.revalidate_prefix("/admin").await, 2);
        assert!(cache.contains("/administrator").await);
        assert!(cache.contains("/").await);

        assert_eq!(cache.revalidate_prefix("/").await, 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let cache = RouteCache::new(None);
        let result: AppResult<Vec<String>> = cache
            .get_or_load("/checkout", || async { Err(AppError::from(CoreError::EmptyCart)) })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = RouteCache::new(Some(Duration::from_millis(20)));
        let calls = AtomicUsize::new(0);
        load(&cache, "/", &calls).await;
        load(&cache, "/", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;
        load(&cache, "/", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = RouteCache::new(None);
        let other = cache.clone();
        let calls = AtomicUsize::new(0);
        load(&cache, "/orders", &calls).await;
        assert!(other.contains("/orders").await);
        other.clear().await;
        assert!(cache.is_empty().await);
    }
}
