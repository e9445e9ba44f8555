//! Client for the Orchard commerce REST API.
//!
//! The remote API owns every business record (accounts, address books,
//! carts, orders). All paths are tenant-scoped:
//!
//! ```text
//! {ORCHARD_API_URL}/api/v1/{tenant}/{path}
//! ```
//!
//! Shipping methods and store lists change rarely and are cached per tenant
//! with `moka`.

mod addresses;
mod auth;
mod cart;
mod orders;

pub use auth::{AuthResponse, EmailStatus, UserProfile};
pub use cart::{Cart, CartLine, ShippingMethod, Store};
pub use orders::PlacedOrder;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use orchard_core::{FieldError, TenantSlug};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::ApiConfig;

/// Maximum number of response body characters kept in an error.
const MAX_ERROR_BODY: usize = 500;

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur when talking to the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
        fields: Vec<FieldError>,
    },

    /// The response body did not match the expected shape.
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// HTTP status returned by the remote API, if it answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the remote API rejected the caller's credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }

    /// Whether the remote API rejected the request payload.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.status(), Some(400 | 409 | 422))
    }

    /// Whether the requested record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }

    /// Message reported by the remote API, for client-facing errors.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Status { message, .. } => message,
            _ => "External service error",
        }
    }

    /// Per-field errors reported by the remote API.
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::Status { fields, .. } => fields,
            _ => &[],
        }
    }
}

/// Error body shapes the remote API uses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "error")]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

// =============================================================================
// Cache
// =============================================================================

/// Cache key for tenant-wide lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    ShippingMethods(TenantSlug),
    Stores(TenantSlug),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    ShippingMethods(Arc<Vec<ShippingMethod>>),
    Stores(Arc<Vec<Store>>),
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the tenant-scoped commerce API.
///
/// Cheap to clone; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("orchard-storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        let cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(Duration::from_secs(config.cache_ttl_secs))
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Full URL for a tenant-scoped path.
    fn endpoint(&self, tenant: &TenantSlug, path: &str) -> String {
        format!("{}/api/v1/{tenant}/{path}", self.inner.base_url)
    }

    /// Start a request, attaching the bearer token when one is supplied.
    fn request(
        &self,
        method: Method,
        tenant: &TenantSlug,
        path: &str,
        token: Option<&str>,
    ) -> (String, RequestBuilder) {
        let endpoint = self.endpoint(tenant, path);
        let mut builder = self.inner.client.request(method, &endpoint);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        (endpoint, builder)
    }

    /// Send a request and decode a JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let text = self.send_raw(endpoint, builder).await?;
        serde_json::from_str(&text).map_err(|source| {
            tracing::error!(
                endpoint,
                error = %source,
                body = %text.chars().take(MAX_ERROR_BODY).collect::<String>(),
                "Failed to decode API response"
            );
            ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            }
        })
    }

    /// Send a request whose response body is ignored.
    async fn send_empty(&self, endpoint: &str, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send_raw(endpoint, builder).await.map(|_| ())
    }

    async fn send_raw(&self, endpoint: &str, builder: RequestBuilder) -> Result<String, ApiError> {
        let http_err = |source| ApiError::Http {
            endpoint: endpoint.to_string(),
            source,
        };

        let response = builder.send().await.map_err(http_err)?;
        let status = response.status();
        let text = response.text().await.map_err(http_err)?;

        debug!(endpoint, status = status.as_u16(), "API response");

        if !status.is_success() {
            let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let message = body.message.unwrap_or_else(|| {
                if text.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                } else {
                    text.chars().take(MAX_ERROR_BODY).collect()
                }
            });
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
                fields: body.errors,
            });
        }

        Ok(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use url::Url;

    /// Client pointed at a mock server.
    pub(crate) fn client_for(base_url: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: Url::parse(base_url).unwrap(),
            timeout_secs: 5,
            cache_ttl_secs: 60,
        })
        .unwrap()
    }

    pub(crate) fn tenant() -> TenantSlug {
        TenantSlug::parse("acme").unwrap()
    }

    #[test]
    fn test_endpoint_is_tenant_scoped() {
        let client = client_for("http://api.local/");
        assert_eq!(
            client.endpoint(&tenant(), "auth/login"),
            "http://api.local/api/v1/acme/auth/login"
        );
    }

    #[test]
    fn test_error_classification() {
        let err = ApiError::Status {
            endpoint: "x".to_string(),
            status: 422,
            message: "Postal code is invalid".to_string(),
            fields: vec![FieldError::new("postal_code", "is invalid")],
        };
        assert!(err.is_validation());
        assert!(!err.is_unauthorized());
        assert_eq!(err.message(), "Postal code is invalid");
        assert_eq!(err.fields().len(), 1);

        let err = ApiError::Status {
            endpoint: "x".to_string(),
            status: 401,
            message: String::new(),
            fields: Vec::new(),
        };
        assert!(err.is_unauthorized());
    }
}
