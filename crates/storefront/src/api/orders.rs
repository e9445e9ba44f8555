//! Order placement.

use orchard_core::{OrderId, TenantSlug};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError};
use crate::checkout::OrderPayload;

/// An order accepted by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub order_number: String,
}

impl ApiClient {
    /// Place an order. Guests send no token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order or the request fails.
    #[instrument(
        skip(self, tenant, token, payload),
        fields(tenant = %tenant, cart_id = %payload.cart_id)
    )]
    pub async fn place_order(
        &self,
        tenant: &TenantSlug,
        token: Option<&str>,
        payload: &OrderPayload,
    ) -> Result<PlacedOrder, ApiError> {
        let (endpoint, req) = self.request(Method::POST, tenant, "orders", token);
        self.send(&endpoint, req.json(payload)).await
    }
}
