//! Address book route handlers.
//!
//! All routes require a signed-in shopper for the path's tenant.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use orchard_core::{
    Address, AddressDraft, AddressId, AddressType, Page, PageRequest, order_for_selection,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireShopper;
use crate::state::AppState;

/// Query for the address selector.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Zero-based page.
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Only return addresses of this type.
    #[serde(default, rename = "type")]
    pub address_type: Option<AddressType>,
    /// Selector the list is shown in; its type is listed first.
    #[serde(default, rename = "for")]
    pub selecting: Option<AddressType>,
}

const fn default_page_size() -> u32 {
    PageRequest::DEFAULT_PAGE_SIZE
}

/// List the shopper's addresses, ordered for the selector.
#[instrument(skip(state, shopper))]
pub async fn index(
    State(state): State<AppState>,
    shopper: RequireShopper,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Address>>> {
    let page = state
        .api()
        .list_addresses(
            shopper.storage.tenant(),
            &shopper.access_token,
            PageRequest::new(query.page, query.page_size),
            query.address_type,
        )
        .await?;

    let preferred = query
        .selecting
        .or(query.address_type)
        .unwrap_or(AddressType::Shipping);
    let Page {
        items,
        total,
        page,
        page_size,
    } = page;

    Ok(Json(Page {
        items: order_for_selection(items, preferred),
        total,
        page,
        page_size,
    }))
}

/// Save a new address.
#[instrument(skip(state, shopper, draft))]
pub async fn create(
    State(state): State<AppState>,
    shopper: RequireShopper,
    Json(draft): Json<AddressDraft>,
) -> Result<(StatusCode, Json<Address>)> {
    draft.validate().map_err(AppError::Validation)?;
    let address = state
        .api()
        .create_address(shopper.storage.tenant(), &shopper.access_token, &draft)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// Update a saved address.
#[instrument(skip(state, shopper, draft))]
pub async fn update(
    State(state): State<AppState>,
    shopper: RequireShopper,
    Path((_tenant, id)): Path<(String, i64)>,
    Json(draft): Json<AddressDraft>,
) -> Result<Json<Address>> {
    draft.validate().map_err(AppError::Validation)?;
    let address = state
        .api()
        .update_address(
            shopper.storage.tenant(),
            &shopper.access_token,
            AddressId::new(id),
            &draft,
        )
        .await?;
    Ok(Json(address))
}
