//! Tenant extractor.
//!
//! Every admin grid is nested under `/{tenant}`; the slug selects which
//! tenant's collections the service token operates on.

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::request::Parts,
};
use orchard_core::TenantSlug;

use crate::error::AppError;

/// Path parameter holding the tenant slug.
pub const TENANT_PARAM: &str = "tenant";

/// The tenant named in the request path, recorded on the request span.
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
        sentry::configure_scope(|scope| scope.set_tag("tenant", tenant.as_str()));
        Ok(Self(tenant))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    async fn handler(CurrentTenant(tenant): CurrentTenant) -> String {
        tenant.to_string()
    }

    #[tokio::test]
    async fn test_rejects_hyphen_edged_slug() {
        let app = Router::new().route("/{tenant}/inventory", get(handler));
        let response = app
            .clone()
            .oneshot(Request::get("/-acme/inventory").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(Request::get("/acme/inventory").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
