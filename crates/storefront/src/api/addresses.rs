//! Address book endpoints.
//!
//! Every call needs the shopper's access token; guests have no address book.

use orchard_core::{Address, AddressDraft, AddressId, AddressType, Page, PageRequest, TenantSlug};
use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, ApiError};

impl ApiClient {
    /// List one page of the address book, optionally filtered by type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, tenant, token), fields(tenant = %tenant))]
    pub async fn list_addresses(
        &self,
        tenant: &TenantSlug,
        token: &str,
        page: PageRequest,
        address_type: Option<AddressType>,
    ) -> Result<Page<Address>, ApiError> {
        let (endpoint, mut req) = self.request(Method::GET, tenant, "addresses", Some(token));
        req = req.query(&page.query_pairs());
        if let Some(address_type) = address_type {
            req = req.query(&[("type", address_type.as_str())]);
        }
        self.send(&endpoint, req).await
    }

    /// Add an address to the address book.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the address or the request fails.
    #[instrument(skip(self, tenant, token, draft), fields(tenant = %tenant))]
    pub async fn create_address(
        &self,
        tenant: &TenantSlug,
        token: &str,
        draft: &AddressDraft,
    ) -> Result<Address, ApiError> {
        let (endpoint, req) = self.request(Method::POST, tenant, "addresses", Some(token));
        self.send(&endpoint, req.json(draft)).await
    }

    /// Patch an existing address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the address or the request fails.
    #[instrument(skip(self, tenant, token, draft), fields(tenant = %tenant))]
    pub async fn update_address(
        &self,
        tenant: &TenantSlug,
        token: &str,
        id: AddressId,
        draft: &AddressDraft,
    ) -> Result<Address, ApiError> {
        let (endpoint, req) =
            self.request(Method::PATCH, tenant, &format!("addresses/{id}"), Some(token));
        self.send(&endpoint, req.json(draft)).await
    }
}
