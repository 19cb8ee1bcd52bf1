//! `/api/payments`

use reqwest::Method;
use tracing::info;

use crate::client::{ApiClient, Auth};
use crate::error::ApiResult;
use crate::wire::{self, PaymentRequest, WirePayment};
use gearent_core::{Id, NewPayment, Payment};

pub struct PaymentsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PaymentsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, payment: &NewPayment) -> ApiResult<Payment> {
        let body = self
            .client
            .call(Method::POST, "/api/payments", Auth::Required, |rb| {
                rb.json(&PaymentRequest::from(payment))
            })
            .await?;
        let created: Payment = wire::decode_entity::<WirePayment>(&body)?.try_into()?;
        info!(
            payment_id = %created.id,
            order_id = %created.order_id,
            amount = %created.amount,
            "Payment created"
        );
        Ok(created)
    }

    pub async fn get(&self, id: &Id) -> ApiResult<Payment> {
        let body = self
            .client
            .call(Method::GET, &format!("/api/payments/{id}"), Auth::Required, |rb| rb)
            .await?;
        wire::decode_entity::<WirePayment>(&body)?.try_into()
    }
}
