//! `/api/orders`: the signed-in user's orders and admin status changes.

use reqwest::Method;
use tracing::{debug, info};

use crate::client::{ApiClient, Auth};
use crate::error::ApiResult;
use crate::wire::{self, OrderRequest, StatusRequest, WireOrder};
use gearent_core::{Id, NewOrder, OrderDetail, OrderStatus};

pub struct OrdersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> OrdersApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn detail(body: &str) -> ApiResult<OrderDetail> {
        wire::decode_entity::<WireOrder>(body)?.try_into()
    }

    pub async fn list(&self) -> ApiResult<Vec<OrderDetail>> {
        let body = self
            .client
            .call(Method::GET, "/api/orders", Auth::Required, |rb| rb)
            .await?;
        let orders = wire::decode_list::<WireOrder>(&body)?
            .items
            .into_iter()
            .map(OrderDetail::try_from)
            .collect::<ApiResult<Vec<_>>>()?;
        debug!(count = orders.len(), "Loaded orders");
        Ok(orders)
    }

    pub async fn get(&self, id: &Id) -> ApiResult<OrderDetail> {
        let body = self
            .client
            .call(Method::GET, &format!("/api/orders/{id}"), Auth::Required, |rb| rb)
            .await?;
        Self::detail(&body)
    }

    pub async fn create(&self, order: &NewOrder) -> ApiResult<OrderDetail> {
        let body = self
            .client
            .call(Method::POST, "/api/orders", Auth::Required, |rb| {
                rb.json(&OrderRequest::from(order))
            })
            .await?;
        let detail = Self::detail(&body)?;
        info!(
            order_id = %detail.order.id,
            lines = order.items.len(),
            total = %detail.order.total_amount,
            "Order placed"
        );
        Ok(detail)
    }

    pub async fn update_status(&self, id: &Id, status: OrderStatus) -> ApiResult<OrderDetail> {
        let body = self
            .client
            .call(
                Method::PATCH,
                &format!("/api/orders/{id}/status"),
                Auth::Required,
                |rb| rb.json(&StatusRequest { status }),
            )
            .await?;
        info!(order_id = %id, status = status.as_str(), "Order status updated");
        Self::detail(&body)
    }

    pub async fn cancel(&self, id: &Id) -> ApiResult<OrderDetail> {
        let body = self
            .client
            .call(
                Method::POST,
                &format!("/api/orders/{id}/cancel"),
                Auth::Required,
                |rb| rb,
            )
            .await?;
        info!(order_id = %id, "Order cancelled");
        Self::detail(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_server::{client_for, serve};
    use gearent_core::{Money, NewOrderLine};

    #[tokio::test]
    async fn test_create_order_request_and_response() {
        let (base, server) = serve(vec![(
            201,
            r#"{"data": {"id": 100, "userId": 7, "status": "PENDING", "totalAmount": "320000",
                "items": [
                    {"productId": 1, "productName": "Trek Marlin 5", "pricePerDay": 50000,
                     "quantity": 2, "durationDays": 3},
                    {"product": {"id": 2, "name": "Soccer Ball"}, "price": 20000}
                ]}}"#,
        )])
        .await;
        let api = client_for(&base);
        api.set_token(Some("tok".into())).await;

        let order = NewOrder {
            items: vec![
                NewOrderLine {
                    product_id: Id::from(1),
                    quantity: 2,
                    duration_days: 3,
                },
                NewOrderLine {
                    product_id: Id::from(2),
                    quantity: 1,
                    duration_days: 1,
                },
            ],
            address_id: None,
            rental_start: None,
            total_amount: Money::new(320_000),
        };
        let detail = api.orders().create(&order).await.unwrap();
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.total_amount, Money::new(320_000));
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[1].product_name, "Soccer Ball");
        assert_eq!(detail.items[1].id, Id::new("100-2"));

        let seen = server.await.unwrap();
        let sent = seen[0].json();
        assert_eq!(sent["items"][0]["productId"], "1");
        assert_eq!(sent["items"][0]["durationDays"], 3);
        assert_eq!(sent["totalAmount"], 320000);
        assert!(sent.get("addressId").is_none());
    }

    #[tokio::test]
    async fn test_list_bare_array() {
        let (base, _server) = serve(vec![(
            200,
            r#"[{"id": 1, "status": "renting", "total": 50000},
                {"id": 2, "status": "canceled", "total": 20000}]"#,
        )])
        .await;
        let api = client_for(&base);
        api.set_token(Some("tok".into())).await;

        let orders = api.orders().list().await.unwrap();
        assert_eq!(orders[0].order.status, OrderStatus::Renting);
        assert_eq!(orders[1].order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_unknown_status_is_decode_error() {
        let (base, _server) = serve(vec![(200, r#"{"id": 1, "status": "lost"}"#)]).await;
        let api = client_for(&base);
        api.set_token(Some("tok".into())).await;

        let err = api.orders().get(&Id::from(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_update_status_and_cancel_paths() {
        let (base, server) = serve(vec![
            (200, r#"{"id": 4, "status": "confirmed"}"#),
            (200, r#"{"id": 4, "status": "cancelled"}"#),
        ])
        .await;
        let api = client_for(&base);
        api.set_token(Some("tok".into())).await;

        let confirmed = api
            .orders()
            .update_status(&Id::from(4), OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.order.status, OrderStatus::Confirmed);
        let cancelled = api.orders().cancel(&Id::from(4)).await.unwrap();
        assert!(cancelled.order.status.is_terminal());

        let seen = server.await.unwrap();
        assert_eq!(seen[0].method, "PATCH");
        assert_eq!(seen[0].path, "/api/orders/4/status");
        assert_eq!(seen[0].json(), serde_json::json!({"status": "confirmed"}));
        assert_eq!(seen[1].method, "POST");
        assert_eq!(seen[1].path, "/api/orders/4/cancel");
    }
}
