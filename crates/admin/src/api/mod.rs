//! Client for the Orchard service-management REST API.
//!
//! Authenticates with the HIGH PRIVILEGE service token from
//! `ORCHARD_API_TOKEN`. All paths are tenant-scoped:
//!
//! ```text
//! {ORCHARD_API_URL}/api/v1/{tenant}/{path}
//! ```
//!
//! Listings are requested with a 1-based `page` and a `pageSize`; see
//! [`orchard_core::PageRequest::query_pairs`].

mod resource;

pub use resource::{Listing, Lookup, LookupEntry, Resource};

use std::sync::Arc;
use std::time::Duration;

use orchard_core::{FieldError, TenantSlug};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
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

    /// Message reported by the remote API.
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
// ServiceApiClient
// =============================================================================

/// Client for the tenant-scoped service-management API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ServiceApiClient {
    inner: Arc<ServiceApiClientInner>,
}

struct ServiceApiClientInner {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl ServiceApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("orchard-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            inner: Arc::new(ServiceApiClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                token: config.token.clone(),
            }),
        })
    }

    /// Full URL for a tenant-scoped path.
    fn endpoint(&self, tenant: &TenantSlug, path: &str) -> String {
        format!("{}/api/v1/{tenant}/{path}", self.inner.base_url)
    }

    /// Start an authenticated request.
    fn request(&self, method: Method, tenant: &TenantSlug, path: &str) -> (String, RequestBuilder) {
        let endpoint = self.endpoint(tenant, path);
        let builder = self
            .inner
            .client
            .request(method, &endpoint)
            .bearer_auth(self.inner.token.expose_secret());
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
