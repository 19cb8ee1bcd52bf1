//! `/api/reviews`

use reqwest::Method;
use tracing::info;

use crate::client::{ApiClient, Auth};
use crate::error::ApiResult;
use crate::wire::{self, ReviewRequest, WireReview};
use gearent_core::{Id, NewReview, Review};

pub struct ReviewsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ReviewsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Reviews of one product.
    pub async fn list(&self, product_id: &Id) -> ApiResult<Vec<Review>> {
        let body = self
            .client
            .call(Method::GET, "/api/reviews", Auth::IfAvailable, |rb| {
                rb.query(&[("productId", product_id.as_str())])
            })
            .await?;
        Ok(wire::decode_list::<WireReview>(&body)?
            .items
            .into_iter()
            .map(Review::from)
            .collect())
    }

    pub async fn create(&self, review: &NewReview) -> ApiResult<Review> {
        let body = self
            .client
            .call(Method::POST, "/api/reviews", Auth::Required, |rb| {
                rb.json(&ReviewRequest::from(review))
            })
            .await?;
        let created: Review = wire::decode_entity::<WireReview>(&body)?.into();
        info!(review_id = %created.id, product_id = %created.product_id, "Review posted");
        Ok(created)
    }

    pub async fn delete(&self, id: &Id) -> ApiResult<()> {
        self.client
            .call(
                Method::DELETE,
                &format!("/api/reviews/{id}"),
                Auth::Required,
                |rb| rb,
            )
            .await?;
        Ok(())
    }
}
