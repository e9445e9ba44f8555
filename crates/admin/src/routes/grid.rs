//! Generic grid and drawer handlers.
//!
//! One set of handlers serves every collection: a grid page, the JSON grid
//! (table configuration plus one page of records) and, for editable
//! collections, the drawer's get/create/patch/delete.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use orchard_core::{Page, PageRequest, TenantSlug};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};
use url::form_urlencoded;

use crate::api::{Listing, Resource};
use crate::components::{DataTableConfig, TableColumn, TableFilter};
use crate::error::{AppError, Result, add_write_breadcrumb};
use crate::filters;
use crate::middleware::CurrentTenant;
use crate::state::AppState;

use super::{NavLink, nav_links};

/// Query parameters for a grid.
type RawParams = Vec<(String, String)>;

// =============================================================================
// Query
// =============================================================================

/// A parsed grid query.
///
/// Only filters the table declares are kept, so arbitrary parameters are
/// never forwarded to the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridQuery {
    /// Zero-based page.
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub tab: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl GridQuery {
    /// Parse raw query parameters against a table configuration.
    ///
    /// A tab's preset fills its filter unless the filter is given explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] for a malformed page number or an
    /// unknown tab.
    pub fn parse(params: RawParams, table: &DataTableConfig) -> Result<Self> {
        let mut query = Self {
            page: 0,
            page_size: PageRequest::DEFAULT_PAGE_SIZE,
            search: None,
            tab: None,
            filters: BTreeMap::new(),
        };

        for (key, value) in params {
            let value = value.trim();
            match key.as_str() {
                "page" => query.page = parse_number(&key, value)?,
                "page_size" => query.page_size = parse_number(&key, value)?,
                _ if value.is_empty() => {}
                "search" => query.search = Some(value.to_string()),
                "tab" => {
                    let tab = table
                        .find_tab(value)
                        .ok_or_else(|| AppError::BadRequest(format!("unknown tab: {value}")))?;
                    query.tab = Some(tab.key.clone());
                }
                other if table.find_filter(other).is_some() => {
                    query.filters.insert(other.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        if let Some(tab) = query.tab.as_deref().and_then(|key| table.find_tab(key))
            && let Some((filter, value)) = &tab.preset
        {
            query
                .filters
                .entry(filter.clone())
                .or_insert_with(|| value.clone());
        }

        Ok(query)
    }

    /// Page request, with the page size clamped.
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }

    /// Parameters forwarded to the remote listing after `page`/`pageSize`.
    #[must_use]
    pub fn remote_filters(&self) -> Vec<(String, String)> {
        self.search
            .iter()
            .map(|s| ("search".to_string(), s.clone()))
            .chain(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }

    /// Query string for the same grid at another page.
    #[must_use]
    pub fn href_for_page(&self, page: u32) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        out.append_pair("page", &page.to_string());
        out.append_pair("page_size", &self.page_size.to_string());
        if let Some(search) = &self.search {
            out.append_pair("search", search);
        }
        if let Some(tab) = &self.tab {
            out.append_pair("tab", tab);
        }
        for (key, value) in &self.filters {
            out.append_pair(key, value);
        }
        format!("?{}", out.finish())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{key} must be a non-negative integer")))
}

// =============================================================================
// Grid
// =============================================================================

/// A grid as served to the client: configuration plus one page.
#[derive(Debug, Serialize)]
pub struct Grid<T> {
    pub table: DataTableConfig,
    /// Zero-based page.
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub page_count: u64,
    pub has_next: bool,
    pub search: Option<String>,
    pub tab: Option<String>,
    pub filters: BTreeMap<String, String>,
    pub items: Vec<T>,
}

impl<T> Grid<T> {
    fn new(table: DataTableConfig, query: &GridQuery, page: Page<T>) -> Self {
        let page_count = page.page_count();
        let has_next = page.has_next();
        let page_size = if page.page_size == 0 {
            query.page_request().page_size
        } else {
            page.page_size
        };
        Self {
            table,
            page: page.page.saturating_sub(1),
            page_size,
            total: page.total,
            page_count,
            has_next,
            search: query.search.clone(),
            tab: query.tab.clone(),
            filters: query.filters.clone(),
            items: page.items,
        }
    }
}

/// Load a grid: table configuration with lookup options, then one page.
async fn load_grid<L: Listing>(
    state: &AppState,
    tenant: &TenantSlug,
    params: RawParams,
) -> Result<(GridQuery, Grid<L::Record>)> {
    let table = match state
        .lookups()
        .apply(state.api(), tenant, L::LOOKUPS, L::table())
        .await
    {
        Ok(table) => table,
        Err(e) => {
            warn!(collection = L::PATH, error = %e, "Failed to load filter options");
            L::table()
        }
    };

    let query = GridQuery::parse(params, &table)?;
    let page = state
        .api()
        .list::<L>(tenant, query.page_request(), &query.remote_filters())
        .await?;

    let grid = Grid::new(table, &query, page);
    Ok((query, grid))
}

/// JSON grid for a collection.
#[instrument(skip(state, tenant, params), fields(collection = L::PATH))]
pub async fn list<L: Listing>(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Query(params): Query<RawParams>,
) -> Result<Json<Grid<L::Record>>> {
    let (_, grid) = load_grid::<L>(&state, &tenant, params).await?;
    Ok(Json(grid))
}

// =============================================================================
// Grid Page
// =============================================================================

/// One rendered grid row.
#[derive(Debug, Clone)]
pub struct GridRow {
    pub id: String,
    pub class: String,
    pub cells: Vec<String>,
}

/// A filter control with its current value.
#[derive(Debug, Clone)]
pub struct FilterInput {
    pub filter: TableFilter,
    pub value: String,
}

/// Grid page template.
#[derive(Template, WebTemplate)]
#[template(path = "grid/index.html")]
pub struct GridTemplate {
    pub tenant: String,
    pub title: &'static str,
    pub collection: &'static str,
    pub nav: Vec<NavLink>,
    pub table: DataTableConfig,
    pub columns: Vec<TableColumn>,
    pub filter_inputs: Vec<FilterInput>,
    pub rows: Vec<GridRow>,
    pub active_tab: String,
    pub search: String,
    pub page: u32,
    pub page_count: u64,
    pub total: u64,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

fn render_rows<L: Listing>(columns: &[TableColumn], items: &[L::Record]) -> Result<Vec<GridRow>> {
    items
        .iter()
        .map(|record| {
            let value =
                serde_json::to_value(record).map_err(|e| AppError::Internal(e.to_string()))?;
            let cells = columns
                .iter()
                .map(|col| col.kind.format(value.get(&col.key).unwrap_or(&Value::Null)))
                .collect();
            Ok(GridRow {
                id: value.get("id").map(Value::to_string).unwrap_or_default(),
                class: L::row_class(record).unwrap_or_default().to_string(),
                cells,
            })
        })
        .collect()
}

/// Server-rendered grid page for a collection.
#[instrument(skip(state, tenant, params), fields(collection = L::PATH))]
pub async fn page<L: Listing>(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Query(params): Query<RawParams>,
) -> Result<GridTemplate> {
    let (query, grid) = load_grid::<L>(&state, &tenant, params).await?;

    let columns: Vec<TableColumn> = grid.table.default_columns().into_iter().cloned().collect();
    let rows = render_rows::<L>(&columns, &grid.items)?;

    let filter_inputs = grid
        .table
        .filters
        .iter()
        .map(|filter| FilterInput {
            value: grid.filters.get(&filter.key).cloned().unwrap_or_default(),
            filter: filter.clone(),
        })
        .collect();

    let prev_href = grid
        .page
        .checked_sub(1)
        .map(|page| query.href_for_page(page));
    let next_href = grid
        .has_next
        .then(|| query.href_for_page(grid.page.saturating_add(1)));

    Ok(GridTemplate {
        tenant: tenant.to_string(),
        title: L::TITLE,
        collection: L::PATH,
        nav: nav_links(),
        active_tab: grid.tab.clone().unwrap_or_else(|| "all".to_string()),
        search: grid.search.clone().unwrap_or_default(),
        page: grid.page,
        page_count: grid.page_count,
        total: grid.total,
        columns,
        filter_inputs,
        rows,
        prev_href,
        next_href,
        table: grid.table,
    })
}

// =============================================================================
// Drawer
// =============================================================================

/// Fetch one record for the drawer.
#[instrument(skip(state, tenant), fields(collection = R::PATH))]
pub async fn show<R: Resource>(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path((_tenant, id)): Path<(String, i64)>,
) -> Result<Json<R::Record>> {
    let record = state.api().get::<R>(&tenant, id).await?;
    Ok(Json(record))
}

/// Create a record from the drawer.
#[instrument(skip(state, tenant, draft), fields(collection = R::PATH))]
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Json(draft): Json<R::Draft>,
) -> Result<(StatusCode, Json<R::Record>)> {
    R::validate_draft(&draft).map_err(AppError::Validation)?;

    let record = state.api().create::<R>(&tenant, &draft).await?;
    state.lookups().invalidate(&tenant, R::PATH).await;

    add_write_breadcrumb(R::PATH, "create", None);
    info!(tenant = %tenant, collection = R::PATH, "Record created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// Patch a record from the drawer.
#[instrument(skip(state, tenant, patch), fields(collection = R::PATH))]
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path((_tenant, id)): Path<(String, i64)>,
    Json(patch): Json<R::Patch>,
) -> Result<Json<R::Record>> {
    R::validate_patch(&patch).map_err(AppError::Validation)?;

    let record = state.api().patch::<R>(&tenant, id, &patch).await?;
    state.lookups().invalidate(&tenant, R::PATH).await;

    add_write_breadcrumb(R::PATH, "update", Some(id));
    info!(tenant = %tenant, collection = R::PATH, id, "Record updated");
    Ok(Json(record))
}

/// Delete a record from the drawer.
#[instrument(skip(state, tenant), fields(collection = R::PATH))]
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path((_tenant, id)): Path<(String, i64)>,
) -> Result<StatusCode> {
    state.api().delete::<R>(&tenant, id).await?;
    state.lookups().invalidate(&tenant, R::PATH).await;

    add_write_breadcrumb(R::PATH, "delete", Some(id));
    info!(tenant = %tenant, collection = R::PATH, id, "Record deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::components::data_table::inventory_table_config;

    fn params(pairs: &[(&str, &str)]) -> RawParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_defaults() {
        let query = GridQuery::parse(vec![], &inventory_table_config()).unwrap();
        assert_eq!(query.page, 0);
        assert_eq!(query.page_size, PageRequest::DEFAULT_PAGE_SIZE);
        assert!(query.remote_filters().is_empty());
    }

    #[test]
    fn test_parse_keeps_declared_filters_only() {
        let query = GridQuery::parse(
            params(&[
                ("page", "2"),
                ("page_size", "50"),
                ("search", " gala "),
                ("location", "North"),
                ("admin", "true"),
                ("status", ""),
            ]),
            &inventory_table_config(),
        )
        .unwrap();

        assert_eq!(query.page_request(), PageRequest::new(2, 50));
        assert_eq!(
            query.remote_filters(),
            vec![
                ("search".to_string(), "gala".to_string()),
                ("location".to_string(), "North".to_string()),
            ]
        );
    }

    #[test]
    fn test_tab_preset_yields_to_explicit_filter() {
        let table = inventory_table_config();

        let query = GridQuery::parse(params(&[("tab", "low")]), &table).unwrap();
        assert_eq!(query.filters.get("status").unwrap(), "low_stock");

        let query =
            GridQuery::parse(params(&[("tab", "low"), ("status", "in_stock")]), &table).unwrap();
        assert_eq!(query.filters.get("status").unwrap(), "in_stock");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let table = inventory_table_config();
        assert!(matches!(
            GridQuery::parse(params(&[("page", "-1")]), &table),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            GridQuery::parse(params(&[("tab", "nope")]), &table),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_href_for_page_keeps_filters() {
        let query = GridQuery::parse(
            params(&[("search", "red apple"), ("tab", "out")]),
            &inventory_table_config(),
        )
        .unwrap();
        assert_eq!(
            query.href_for_page(1),
            "?page=1&page_size=25&search=red+apple&tab=out&status=out_of_stock"
        );
    }

    #[test]
    fn test_grid_reports_zero_based_page() {
        let query = GridQuery::parse(params(&[("page", "1")]), &inventory_table_config()).unwrap();
        let grid = Grid::new(
            inventory_table_config(),
            &query,
            Page {
                items: vec![1, 2],
                total: 60,
                page: 2,
                page_size: 25,
            },
        );
        assert_eq!(grid.page, 1);
        assert_eq!(grid.page_count, 3);
        assert!(grid.has_next);
    }
}
