//! Cached lookup lists for grid filters.
//!
//! The processes grid offers its process groups as filter options, the SOPs
//! grid its processes, the subcategories grid its categories. These lists
//! change rarely, so they are kept per tenant for a short TTL and dropped
//! whenever the admin writes to the source collection.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use orchard_core::TenantSlug;
use tracing::instrument;

use crate::api::{ApiError, Lookup, ServiceApiClient};
use crate::components::{DataTableConfig, FilterOption};

/// Cache key: tenant and source collection.
type LookupKey = (TenantSlug, &'static str);

/// Per-tenant cache of lookup lists.
#[derive(Clone)]
pub struct LookupCache {
    cache: Cache<LookupKey, Arc<Vec<FilterOption>>>,
}

impl LookupCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Options for one lookup, fetched on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the source collection cannot be fetched.
    #[instrument(skip(self, api, tenant), fields(tenant = %tenant))]
    pub async fn options(
        &self,
        api: &ServiceApiClient,
        tenant: &TenantSlug,
        source: &'static str,
    ) -> Result<Arc<Vec<FilterOption>>, ApiError> {
        let key = (tenant.clone(), source);
        if let Some(options) = self.cache.get(&key).await {
            return Ok(options);
        }

        let options: Vec<FilterOption> = api
            .lookup_entries(tenant, source)
            .await?
            .into_iter()
            .map(|entry| FilterOption::new(&entry.id.to_string(), &entry.name))
            .collect();
        let options = Arc::new(options);
        self.cache.insert(key, Arc::clone(&options)).await;
        Ok(options)
    }

    /// Fill the lookup-backed filters of a table configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a source collection cannot be fetched.
    pub async fn apply(
        &self,
        api: &ServiceApiClient,
        tenant: &TenantSlug,
        lookups: &[Lookup],
        mut table: DataTableConfig,
    ) -> Result<DataTableConfig, ApiError> {
        for lookup in lookups {
            let options = self.options(api, tenant, lookup.source).await?;
            table = table.with_options(lookup.filter, lookup.label, options.to_vec());
        }
        Ok(table)
    }

    /// Drop the cached list for `source` after a write to it.
    pub async fn invalidate(&self, tenant: &TenantSlug, source: &'static str) {
        self.cache.invalidate(&(tenant.clone(), source)).await;
    }
}
