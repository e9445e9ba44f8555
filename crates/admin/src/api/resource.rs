//! Uniform list/get/create/patch/delete over remote collections.
//!
//! Every grid in the admin is backed by one remote collection. [`Listing`]
//! describes a collection that can be paged through; [`Resource`] adds the
//! drawer operations for collections the admin may edit.

use orchard_core::{FieldError, Page, PageRequest, TenantSlug};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiError, ServiceApiClient};
use crate::components::DataTableConfig;

/// A select filter whose options come from another collection.
#[derive(Debug, Clone, Copy)]
pub struct Lookup {
    /// Filter key on the grid being configured.
    pub filter: &'static str,
    pub label: &'static str,
    /// Collection the options are read from.
    pub source: &'static str,
}

/// The id and display name of a record, as used in filter options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LookupEntry {
    pub id: i64,
    #[serde(alias = "title")]
    pub name: String,
}

/// A remote collection shown as a paged grid.
pub trait Listing: Send + Sync + 'static {
    /// Collection path, both remote (`/api/v1/{tenant}/{PATH}`) and local.
    const PATH: &'static str;
    /// Plural display title.
    const TITLE: &'static str;
    /// Filters populated from other collections.
    const LOOKUPS: &'static [Lookup] = &[];

    type Record: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Declarative grid configuration.
    fn table() -> DataTableConfig;

    /// CSS class highlighting a grid row.
    fn row_class(_record: &Self::Record) -> Option<&'static str> {
        None
    }
}

/// A collection the admin can create, edit and delete records in.
pub trait Resource: Listing {
    /// Body of a create request.
    type Draft: Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Body of a patch request; absent fields are left unchanged.
    type Patch: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Check a draft before it is sent.
    ///
    /// # Errors
    ///
    /// Returns every offending field.
    fn validate_draft(draft: &Self::Draft) -> Result<(), Vec<FieldError>>;

    /// Check a patch before it is sent.
    ///
    /// # Errors
    ///
    /// Returns every offending field.
    fn validate_patch(patch: &Self::Patch) -> Result<(), Vec<FieldError>>;
}

impl ServiceApiClient {
    /// Fetch one page of a collection.
    ///
    /// `page` is zero-based; the request carries `page=N+1&pageSize=P`
    /// followed by `filters` as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, tenant), fields(tenant = %tenant, collection = L::PATH))]
    pub async fn list<L: Listing>(
        &self,
        tenant: &TenantSlug,
        page: PageRequest,
        filters: &[(String, String)],
    ) -> Result<Page<L::Record>, ApiError> {
        let (endpoint, req) = self.request(Method::GET, tenant, L::PATH);
        let req = req.query(&page.query_pairs()).query(filters);
        self.send(&endpoint, req).await
    }

    /// Fetch one record for the drawer.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or the request fails.
    #[instrument(skip(self, tenant), fields(tenant = %tenant, collection = R::PATH))]
    pub async fn get<R: Resource>(
        &self,
        tenant: &TenantSlug,
        id: i64,
    ) -> Result<R::Record, ApiError> {
        let (endpoint, req) = self.request(Method::GET, tenant, &format!("{}/{id}", R::PATH));
        self.send(&endpoint, req).await
    }

    /// Create a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the draft or the request fails.
    #[instrument(skip(self, tenant, draft), fields(tenant = %tenant, collection = R::PATH))]
    pub async fn create<R: Resource>(
        &self,
        tenant: &TenantSlug,
        draft: &R::Draft,
    ) -> Result<R::Record, ApiError> {
        let (endpoint, req) = self.request(Method::POST, tenant, R::PATH);
        self.send(&endpoint, req.json(draft)).await
    }

    /// Patch a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the patch or the request fails.
    #[instrument(skip(self, tenant, patch), fields(tenant = %tenant, collection = R::PATH))]
    pub async fn patch<R: Resource>(
        &self,
        tenant: &TenantSlug,
        id: i64,
        patch: &R::Patch,
    ) -> Result<R::Record, ApiError> {
        let (endpoint, req) = self.request(Method::PATCH, tenant, &format!("{}/{id}", R::PATH));
        self.send(&endpoint, req.json(patch)).await
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or the request fails.
    #[instrument(skip(self, tenant), fields(tenant = %tenant, collection = R::PATH))]
    pub async fn delete<R: Resource>(&self, tenant: &TenantSlug, id: i64) -> Result<(), ApiError> {
        let (endpoint, req) = self.request(Method::DELETE, tenant, &format!("{}/{id}", R::PATH));
        self.send_empty(&endpoint, req).await
    }

    /// Fetch the first page of `source` at the largest page size, as
    /// id/name pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, tenant), fields(tenant = %tenant))]
    pub async fn lookup_entries(
        &self,
        tenant: &TenantSlug,
        source: &str,
    ) -> Result<Vec<LookupEntry>, ApiError> {
        let page = PageRequest::new(0, PageRequest::MAX_PAGE_SIZE);
        let (endpoint, req) = self.request(Method::GET, tenant, source);
        let page: Page<LookupEntry> = self.send(&endpoint, req.query(&page.query_pairs())).await?;
        if page.has_next() {
            tracing::warn!(source, total = page.total, "Lookup list truncated to first page");
        }
        Ok(page.items)
    }
}
