//! # Catalog Pages
//!
//! ```text
//! /                  home            categories + newest gear (catalog DB)
//! /products?...      product_list    filtered listing (REST)
//! /products/{id}     product_detail  product + reviews (REST)
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppResult;
use crate::AppState;
use gearent_api::ProductQuery;
use gearent_core::validation::validate_search_query;
use gearent_core::{average_rating, Category, Id, Product, Review};

/// Products on the home page shelf.
pub const HOME_SHELF_SIZE: u32 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeView {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
}

pub async fn home(state: &AppState) -> AppResult<HomeView> {
    state
        .cache
        .get_or_load("/", || async {
            let categories = state.db.categories().list().await?;
            let products = state.db.products().list_newest(HOME_SHELF_SIZE).await?;
            debug!(categories = categories.len(), products = products.len(), "Home loaded");
            Ok(HomeView {
                categories,
                products,
            })
        })
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListView {
    pub category: Option<String>,
    pub search: Option<String>,
    pub products: Vec<Product>,
    pub total: Option<u64>,
    pub page: Option<u32>,
}

/// Cache key for a listing: `/products` plus the non-empty filters.
fn listing_path(query: &ProductQuery) -> String {
    let mut params = Vec::new();
    if let Some(category) = &query.category {
        params.push(format!("category={category}"));
    }
    if let Some(search) = &query.search {
        params.push(format!("search={search}"));
    }
    if let Some(page) = query.page {
        params.push(format!("page={page}"));
    }
    if let Some(limit) = query.limit {
        params.push(format!("limit={limit}"));
    }

    if params.is_empty() {
        "/products".to_string()
    } else {
        format!("/products?{}", params.join("&"))
    }
}

pub async fn product_list(state: &AppState, query: &ProductQuery) -> AppResult<ProductListView> {
    let search = match &query.search {
        Some(search) => Some(validate_search_query(search)?).filter(|s| !s.is_empty()),
        None => None,
    };
    let query = ProductQuery {
        category: query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        search,
        ..query.clone()
    };

    state
        .cache
        .get_or_load(&listing_path(&query), || async {
            let page = state.api.products().list(&query).await?;
            Ok(ProductListView {
                category: query.category.clone(),
                search: query.search.clone(),
                products: page.items,
                total: page.total,
                page: page.page,
            })
        })
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetailView {
    pub product: Product,
    pub reviews: Vec<Review>,
    pub average_rating: Option<f64>,
}

pub async fn product_detail(state: &AppState, id: &Id) -> AppResult<ProductDetailView> {
    state
        .cache
        .get_or_load(&format!("/products/{id}"), || async {
            let product = state.api.products().get(id).await?;
            let reviews = state.api.reviews().list(id).await?;
            Ok(ProductDetailView {
                average_rating: average_rating(&reviews),
                product,
                reviews,
            })
        })
        .await
}
