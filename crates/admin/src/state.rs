//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiError, ServiceApiClient};
use crate::config::AdminConfig;
use crate::services::LookupCache;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    api: ServiceApiClient,
    lookups: LookupCache,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be constructed.
    pub fn new(config: AdminConfig) -> Result<Self, ApiError> {
        let api = ServiceApiClient::new(&config.api)?;
        let lookups = LookupCache::new(Duration::from_secs(config.lookup_cache_ttl_secs));
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                lookups,
            }),
        })
    }

    /// Get the application configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get the service-management API client.
    #[must_use]
    pub fn api(&self) -> &ServiceApiClient {
        &self.inner.api
    }

    /// Get the lookup list cache.
    #[must_use]
    pub fn lookups(&self) -> &LookupCache {
        &self.inner.lookups
    }
}
