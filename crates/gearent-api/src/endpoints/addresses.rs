//! `/api/addresses`: the signed-in user's delivery addresses.

use reqwest::Method;
use tracing::debug;

use crate::client::{ApiClient, Auth};
use crate::error::ApiResult;
use crate::wire::{self, AddressRequest, WireAddress};
use gearent_core::{Address, Id, NewAddress};

pub struct AddressesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AddressesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Address>> {
        let body = self
            .client
            .call(Method::GET, "/api/addresses", Auth::Required, |rb| rb)
            .await?;
        Ok(wire::decode_list::<WireAddress>(&body)?
            .items
            .into_iter()
            .map(Address::from)
            .collect())
    }

    pub async fn create(&self, address: &NewAddress) -> ApiResult<Address> {
        let body = self
            .client
            .call(Method::POST, "/api/addresses", Auth::Required, |rb| {
                rb.json(&AddressRequest::from(address))
            })
            .await?;
        let created: Address = wire::decode_entity::<WireAddress>(&body)?.into();
        debug!(address_id = %created.id, "Address saved");
        Ok(created)
    }

    pub async fn update(&self, id: &Id, address: &NewAddress) -> ApiResult<Address> {
        let body = self
            .client
            .call(
                Method::PUT,
                &format!("/api/addresses/{id}"),
                Auth::Required,
                |rb| rb.json(&AddressRequest::from(address)),
            )
            .await?;
        Ok(wire::decode_entity::<WireAddress>(&body)?.into())
    }

    pub async fn delete(&self, id: &Id) -> ApiResult<()> {
        self.client
            .call(
                Method::DELETE,
                &format!("/api/addresses/{id}"),
                Auth::Required,
                |rb| rb,
            )
            .await?;
        Ok(())
    }

    pub async fn set_default(&self, id: &Id) -> ApiResult<Address> {
        let body = self
            .client
            .call(
                Method::PATCH,
                &format!("/api/addresses/{id}/default"),
                Auth::Required,
                |rb| rb,
            )
            .await?;
        Ok(wire::decode_entity::<WireAddress>(&body)?.into())
    }
}
