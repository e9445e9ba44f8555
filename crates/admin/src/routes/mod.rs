//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Health check
//! GET  /{tenant}                                 - Redirects to the inventory grid
//!
//! # Inventory (read-only)
//! GET  /{tenant}/inventory                       - Grid page (HTML)
//! GET  /{tenant}/api/inventory                   - Grid JSON
//!
//! # Service management, one block per collection:
//! #   process-groups, processes, sops, functions,
//! #   service-categories, service-subcategories, service-user-types
//! GET    /{tenant}/{collection}                  - Grid page (HTML)
//! GET    /{tenant}/api/{collection}              - Grid JSON
//! POST   /{tenant}/api/{collection}              - Create
//! GET    /{tenant}/api/{collection}/{id}         - Drawer
//! PATCH  /{tenant}/api/{collection}/{id}         - Update
//! DELETE /{tenant}/api/{collection}/{id}         - Delete
//! ```
//!
//! Grid query parameters: `page` (zero-based), `page_size`, `search`, `tab`,
//! and any filter the collection's table configuration declares.

pub mod grid;

use axum::{
    Router,
    extract::Request,
    http::Response,
    middleware::from_fn,
    response::Redirect,
    routing::get,
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::api::{Listing, Resource};
use crate::middleware::{CurrentTenant, request_id_middleware};
use crate::models::{
    Functions, Inventory, ProcessGroups, Processes, ServiceCategories, ServiceSubcategories,
    ServiceUserTypes, Sops,
};
use crate::state::AppState;

/// A sidebar entry.
#[derive(Debug, Clone)]
pub struct NavLink {
    pub path: &'static str,
    pub title: &'static str,
}

/// Sidebar sections, in display order.
const SECTIONS: &[(&str, &str)] = &[
    (Inventory::PATH, Inventory::TITLE),
    (ProcessGroups::PATH, ProcessGroups::TITLE),
    (Processes::PATH, Processes::TITLE),
    (Sops::PATH, Sops::TITLE),
    (Functions::PATH, Functions::TITLE),
    (ServiceCategories::PATH, ServiceCategories::TITLE),
    (ServiceSubcategories::PATH, ServiceSubcategories::TITLE),
    (ServiceUserTypes::PATH, ServiceUserTypes::TITLE),
];

/// Sidebar links for templates.
#[must_use]
pub fn nav_links() -> Vec<NavLink> {
    SECTIONS
        .iter()
        .map(|&(path, title)| NavLink { path, title })
        .collect()
}

/// Build the full application router.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/{tenant}", tenant_routes())
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        tenant = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Routes nested under `/{tenant}`.
fn tenant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .merge(listing_routes::<Inventory>())
        .merge(crud_routes::<ProcessGroups>())
        .merge(crud_routes::<Processes>())
        .merge(crud_routes::<Sops>())
        .merge(crud_routes::<Functions>())
        .merge(crud_routes::<ServiceCategories>())
        .merge(crud_routes::<ServiceSubcategories>())
        .merge(crud_routes::<ServiceUserTypes>())
}

/// Grid page and grid JSON for a read-only collection.
pub fn listing_routes<L: Listing>() -> Router<AppState> {
    Router::new()
        .route(&format!("/{}", L::PATH), get(grid::page::<L>))
        .route(&format!("/api/{}", L::PATH), get(grid::list::<L>))
}

/// Grid, drawer and write routes for an editable collection.
pub fn crud_routes<R: Resource>() -> Router<AppState> {
    Router::new()
        .route(&format!("/{}", R::PATH), get(grid::page::<R>))
        .route(
            &format!("/api/{}", R::PATH),
            get(grid::list::<R>).post(grid::create::<R>),
        )
        .route(
            &format!("/api/{}/{{id}}", R::PATH),
            get(grid::show::<R>)
                .patch(grid::update::<R>)
                .delete(grid::delete::<R>),
        )
}

/// Land on the first section.
async fn index(CurrentTenant(tenant): CurrentTenant) -> Redirect {
    Redirect::to(&format!("/{tenant}/{}", Inventory::PATH))
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
