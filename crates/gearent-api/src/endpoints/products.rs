//! `/api/products`: catalog listing, detail and admin writes.
//!
//! Creation is multipart so an image can ride along with the fields.

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::{debug, info};

use crate::client::{ApiClient, Auth};
use crate::error::{ApiError, ApiResult};
use crate::wire::{self, Page, ProductPatchRequest, WireProduct};
use gearent_core::{Id, NewProduct, Product, ProductPatch};

/// Listing filters. Unset fields are left off the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Category id or slug.
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductQuery {
    pub fn in_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn matching(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Self::default()
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(category) = self.category.as_deref().filter(|c| !c.trim().is_empty()) {
            params.push(("category", category.trim().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.trim().to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

/// Image file sent with a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Content type guessed from the file extension.
    pub fn mime(&self) -> &'static str {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        }
    }
}

fn product_form(product: &NewProduct, image: Option<ImageUpload>) -> ApiResult<Form> {
    let mut form = Form::new()
        .text("name", product.name.clone())
        .text("pricePerDay", product.price_per_day.amount().to_string())
        .text("stock", product.stock.to_string());

    if let Some(category_id) = &product.category_id {
        form = form.text("categoryId", category_id.to_string());
    }
    if let Some(description) = &product.description {
        form = form.text("description", description.clone());
    }
    if let Some(image_url) = &product.image_url {
        form = form.text("imageUrl", image_url.clone());
    }
    if let Some(image) = image {
        let mime = image.mime();
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(mime)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        form = form.part("image", part);
    }

    Ok(form)
}

pub struct ProductsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProductsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &ProductQuery) -> ApiResult<Page<Product>> {
        let params = query.params();
        let body = self
            .client
            .call(Method::GET, "/api/products", Auth::IfAvailable, |rb| {
                rb.query(&params)
            })
            .await?;

        let page = wire::decode_list::<WireProduct>(&body)?.map(Product::from);
        debug!(count = page.items.len(), total = ?page.total, "Loaded products");
        Ok(page)
    }

    pub async fn get(&self, id: &Id) -> ApiResult<Product> {
        let body = self
            .client
            .call(
                Method::GET,
                &format!("/api/products/{id}"),
                Auth::IfAvailable,
                |rb| rb,
            )
            .await?;
        Ok(wire::decode_entity::<WireProduct>(&body)?.into())
    }

    pub async fn create(
        &self,
        product: &NewProduct,
        image: Option<ImageUpload>,
    ) -> ApiResult<Product> {
        let with_image = image.is_some();
        let form = product_form(product, image)?;
        let body = self
            .client
            .call(Method::POST, "/api/products", Auth::Required, move |rb| {
                rb.multipart(form)
            })
            .await?;

        let created: Product = wire::decode_entity::<WireProduct>(&body)?.into();
        info!(product_id = %created.id, with_image, "Product created");
        Ok(created)
    }

    pub async fn update(&self, id: &Id, patch: &ProductPatch) -> ApiResult<Product> {
        let body = self
            .client
            .call(
                Method::PUT,
                &format!("/api/products/{id}"),
                Auth::Required,
                |rb| rb.json(&ProductPatchRequest::from(patch)),
            )
            .await?;
        Ok(wire::decode_entity::<WireProduct>(&body)?.into())
    }

    pub async fn delete(&self, id: &Id) -> ApiResult<()> {
        self.client
            .call(
                Method::DELETE,
                &format!("/api/products/{id}"),
                Auth::Required,
                |rb| rb,
            )
            .await?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}
