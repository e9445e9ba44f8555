//! Tenant extractors.
//!
//! Every storefront route is nested under `/{tenant}`. These extractors parse
//! the slug from the path and pair it with the visitor's session.

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::request::Parts,
};
use orchard_core::TenantSlug;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::TenantStorage;

/// Path parameter holding the tenant slug.
pub const TENANT_PARAM: &str = "tenant";

/// The tenant named in the request path.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentTenant(tenant): CurrentTenant) -> String {
///     format!("Shopping at {tenant}")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub TenantSlug);

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::BadRequest("missing tenant".to_string()))?;

        let raw = params
            .iter()
            .find_map(|(key, value)| (key == TENANT_PARAM).then_some(value))
            .ok_or_else(|| AppError::BadRequest("missing tenant".to_string()))?;

        let tenant = TenantSlug::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))?;

        tracing::Span::current().record("tenant", tenant.as_str());
        Ok(Self(tenant))
    }
}

/// Session storage scoped to the tenant in the path.
pub struct Storage(pub TenantStorage);

impl<S> FromRequestParts<S> for Storage
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentTenant(tenant) = CurrentTenant::from_request_parts(parts, state).await?;

        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        Ok(Self(TenantStorage::new(session, tenant)))
    }
}
