//! `/api/categories`

use reqwest::Method;
use tracing::info;

use crate::client::{ApiClient, Auth};
use crate::error::ApiResult;
use crate::wire::{self, CategoryRequest, WireCategory};
use gearent_core::{Category, Id, NewCategory};

pub struct CategoriesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CategoriesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Category>> {
        let body = self
            .client
            .call(Method::GET, "/api/categories", Auth::IfAvailable, |rb| rb)
            .await?;
        Ok(wire::decode_list::<WireCategory>(&body)?
            .items
            .into_iter()
            .map(Category::from)
            .collect())
    }

    pub async fn create(&self, category: &NewCategory) -> ApiResult<Category> {
        let body = self
            .client
            .call(Method::POST, "/api/categories", Auth::Required, |rb| {
                rb.json(&CategoryRequest::from(category))
            })
            .await?;
        let created: Category = wire::decode_entity::<WireCategory>(&body)?.into();
        info!(category_id = %created.id, slug = %created.slug, "Category created");
        Ok(created)
    }

    pub async fn update(&self, id: &Id, category: &NewCategory) -> ApiResult<Category> {
        let body = self
            .client
            .call(
                Method::PUT,
                &format!("/api/categories/{id}"),
                Auth::Required,
                |rb| rb.json(&CategoryRequest::from(category)),
            )
            .await?;
        Ok(wire::decode_entity::<WireCategory>(&body)?.into())
    }

    pub async fn delete(&self, id: &Id) -> ApiResult<()> {
        self.client
            .call(
                Method::DELETE,
                &format!("/api/categories/{id}"),
                Auth::Required,
                |rb| rb,
            )
            .await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{client_for, serve};

    #[tokio::test]
    async fn test_list_results_shape() {
        let (base, _server) = serve(vec![(
            200,
            r#"{"results": [{"id": 1, "name": "Water Sports"}], "count": 1}"#,
        )])
        .await;
        let api = client_for(&base);

        let categories = api.categories().list().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].slug, "water-sports");
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let (base, server) = serve(vec![
            (201, r#"{"data": {"id": 6, "name": "Golf", "slug": "golf"}}"#),
            (204, ""),
        ])
        .await;
        let api = client_for(&base);
        api.set_token(Some("admin".into())).await;

        let created = api
            .categories()
            .create(&NewCategory {
                name: "Golf".into(),
                slug: "golf".into(),
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, Id::from(6));
        api.categories().delete(&created.id).await.unwrap();

        let seen = server.await.unwrap();
        assert_eq!(seen[0].json(), serde_json::json!({"name": "Golf", "slug": "golf"}));
        assert_eq!(seen[1].method, "DELETE");
        assert_eq!(seen[1].path, "/api/categories/6");
    }
}
