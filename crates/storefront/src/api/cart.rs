//! Cart, shipping method and store endpoints.

use std::sync::Arc;

use orchard_core::{
    CartLineId, CurrencyCode, Price, ProductId, ShippingLocation, StoreId, TenantSlug,
};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError, CacheKey, CacheValue};

/// A cart as priced for a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    #[serde(default)]
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub currency_code: CurrencyCode,
    #[serde(default)]
    pub subtotal: Decimal,
}

impl Cart {
    /// Subtotal with currency.
    #[must_use]
    pub const fn subtotal_price(&self) -> Price {
        Price::new(self.subtotal, self.currency_code)
    }

    /// Total number of items across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// One line of a cart.
///
/// `delivery_eligible` is computed by the API for the location the cart was
/// fetched with. Without a location every line counts as eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default = "eligible")]
    pub delivery_eligible: bool,
}

const fn eligible() -> bool {
    true
}

/// A shipping method offered by the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub code: String,
    pub label: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub estimated_days: Option<u32>,
}

/// A store that accepts in-store pickup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

#[derive(Serialize)]
struct RemoveLinesBody<'a> {
    line_ids: &'a [CartLineId],
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a ShippingLocation>,
}

fn location_query(location: &ShippingLocation) -> [(&'static str, &str); 3] {
    [
        ("postal_code", location.postal_code.as_str()),
        ("city", location.city.as_str()),
        ("country_code", location.country_code.as_str()),
    ]
}

impl ApiClient {
    /// Fetch a cart, priced and checked for deliverability at `location`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, tenant, token), fields(tenant = %tenant))]
    pub async fn get_cart(
        &self,
        tenant: &TenantSlug,
        token: Option<&str>,
        cart_id: &str,
        location: Option<&ShippingLocation>,
    ) -> Result<Cart, ApiError> {
        let (endpoint, mut req) =
            self.request(Method::GET, tenant, &format!("cart/{cart_id}"), token);
        if let Some(location) = location {
            req = req.query(&location_query(location));
        }
        self.send(&endpoint, req).await
    }

    /// Remove lines from a cart, returning the updated cart.
    ///
    /// The returned cart is the completion signal for the removal; callers
    /// re-check deliverability against it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, tenant, token), fields(tenant = %tenant))]
    pub async fn remove_cart_lines(
        &self,
        tenant: &TenantSlug,
        token: Option<&str>,
        cart_id: &str,
        line_ids: &[CartLineId],
        location: Option<&ShippingLocation>,
    ) -> Result<Cart, ApiError> {
        let (endpoint, req) = self.request(
            Method::POST,
            tenant,
            &format!("cart/{cart_id}/lines/remove"),
            token,
        );
        let body = RemoveLinesBody { line_ids, location };
        self.send(&endpoint, req.json(&body)).await
    }

    /// Invalidate a cart after its order was placed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, tenant, token), fields(tenant = %tenant))]
    pub async fn invalidate_cart(
        &self,
        tenant: &TenantSlug,
        token: Option<&str>,
        cart_id: &str,
    ) -> Result<(), ApiError> {
        let (endpoint, req) = self.request(
            Method::POST,
            tenant,
            &format!("cart/{cart_id}/invalidate"),
            token,
        );
        self.send_empty(&endpoint, req).await
    }

    /// Shipping methods offered by the tenant (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, tenant), fields(tenant = %tenant))]
    pub async fn shipping_methods(
        &self,
        tenant: &TenantSlug,
    ) -> Result<Arc<Vec<ShippingMethod>>, ApiError> {
        let key = CacheKey::ShippingMethods(tenant.clone());
        if let Some(CacheValue::ShippingMethods(methods)) = self.inner.cache.get(&key).await {
            tracing::debug!("Cache hit for shipping methods");
            return Ok(methods);
        }

        let (endpoint, req) = self.request(Method::GET, tenant, "shipping-methods", None);
        let methods: Arc<Vec<ShippingMethod>> = Arc::new(self.send(&endpoint, req).await?);
        self.inner
            .cache
            .insert(key, CacheValue::ShippingMethods(Arc::clone(&methods)))
            .await;
        Ok(methods)
    }

    /// Stores that accept in-store pickup (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, tenant), fields(tenant = %tenant))]
    pub async fn stores(&self, tenant: &TenantSlug) -> Result<Arc<Vec<Store>>, ApiError> {
        let key = CacheKey::Stores(tenant.clone());
        if let Some(CacheValue::Stores(stores)) = self.inner.cache.get(&key).await {
            tracing::debug!("Cache hit for stores");
            return Ok(stores);
        }

        let (endpoint, req) = self.request(Method::GET, tenant, "stores", None);
        let stores: Arc<Vec<Store>> = Arc::new(self.send(&endpoint, req).await?);
        self.inner
            .cache
            .insert(key, CacheValue::Stores(Arc::clone(&stores)))
            .await;
        Ok(stores)
    }
}
