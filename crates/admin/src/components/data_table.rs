//! Data table component types.
//!
//! These types define the declarative configuration served alongside every
//! grid: which columns exist, which filters the remote listing accepts and
//! which tabs preset a filter.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a column's values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    /// Right-aligned counter.
    Number,
    /// Rendered as Yes/No.
    Boolean,
    Date,
}

impl ColumnKind {
    /// Render a record field as grid cell text.
    #[must_use]
    pub fn format(self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Null) => String::new(),
            (Self::Boolean, Value::Bool(true)) => "Yes".to_string(),
            (Self::Boolean, Value::Bool(false)) => "No".to_string(),
            (Self::Date, Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map_or_else(|_| s.clone(), |dt| dt.format("%b %-d, %Y").to_string()),
            (_, Value::String(s)) => s.clone(),
            (_, other) => other.to_string(),
        }
    }
}

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Record field shown in the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    pub kind: ColumnKind,
    /// Whether the column is visible by default.
    pub default_visible: bool,
}

impl TableColumn {
    /// Create a text column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: ColumnKind::Text,
            default_visible: true,
        }
    }

    /// Create a numeric column.
    #[must_use]
    pub fn number(key: &str, label: &str) -> Self {
        Self {
            kind: ColumnKind::Number,
            ..Self::new(key, label)
        }
    }

    /// Create a yes/no column.
    #[must_use]
    pub fn boolean(key: &str, label: &str) -> Self {
        Self {
            kind: ColumnKind::Boolean,
            ..Self::new(key, label)
        }
    }

    /// Create a date column.
    #[must_use]
    pub fn date(key: &str, label: &str) -> Self {
        Self {
            kind: ColumnKind::Date,
            ..Self::new(key, label)
        }
    }

    /// Set whether the column is visible by default.
    #[must_use]
    pub const fn visible(mut self, visible: bool) -> Self {
        self.default_visible = visible;
        self
    }
}

/// Filter type for data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Text input filter.
    Text,
    /// Single-select dropdown.
    Select,
}

/// Filter definition for a data table.
///
/// `key` is also the query parameter forwarded to the remote listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFilter {
    /// Filter parameter key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Filter type.
    pub filter_type: FilterType,
    /// Placeholder text (for text inputs).
    pub placeholder: Option<String>,
    /// Available options (for selects).
    pub options: Vec<FilterOption>,
}

/// Option for select filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

impl TableFilter {
    /// Create a text filter.
    #[must_use]
    pub fn text(key: &str, label: &str, placeholder: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Text,
            placeholder: Some(placeholder.to_string()),
            options: vec![],
        }
    }

    /// Create a select filter.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Select,
            placeholder: None,
            options,
        }
    }

    /// Whether this filter renders as a dropdown.
    #[must_use]
    pub fn is_select(&self) -> bool {
        self.filter_type == FilterType::Select
    }
}

/// A tab above the grid. Selecting it applies a preset filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableTab {
    pub key: String,
    pub label: String,
    /// Filter key and value applied by the tab; `None` shows everything.
    pub preset: Option<(String, String)>,
}

impl TableTab {
    /// The unfiltered tab.
    #[must_use]
    pub fn all() -> Self {
        Self {
            key: "all".to_string(),
            label: "All".to_string(),
            preset: None,
        }
    }

    /// A tab that applies `filter=value`.
    #[must_use]
    pub fn preset(key: &str, label: &str, filter: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            preset: Some((filter.to_string(), value.to_string())),
        }
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Filter definitions.
    pub filters: Vec<TableFilter>,
    /// Tab definitions; empty when the grid has no tabs.
    pub tabs: Vec<TableTab>,
    /// Search placeholder text.
    pub search_placeholder: String,
    /// Icon for empty state.
    pub empty_icon: String,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
    /// Whether to show filter panel.
    pub has_filters: bool,
    /// Whether rows open an editable drawer.
    pub editable: bool,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            filters: vec![],
            tabs: vec![],
            search_placeholder: "Search...".to_string(),
            empty_icon: "ph-list".to_string(),
            empty_title: "No items found".to_string(),
            empty_description: None,
            has_filters: false,
            editable: true,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.has_filters = true;
        self.filters.push(filter);
        self
    }

    /// Add a tab.
    #[must_use]
    pub fn tab(mut self, tab: TableTab) -> Self {
        self.tabs.push(tab);
        self
    }

    /// Mark the grid as read-only.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Set empty state configuration.
    #[must_use]
    pub fn empty_state(mut self, icon: &str, title: &str, description: Option<&str>) -> Self {
        self.empty_icon = icon.to_string();
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    /// Get default visible columns.
    #[must_use]
    pub fn default_columns(&self) -> Vec<&TableColumn> {
        self.columns.iter().filter(|c| c.default_visible).collect()
    }

    /// Find a filter by key.
    #[must_use]
    pub fn find_filter(&self, key: &str) -> Option<&TableFilter> {
        self.filters.iter().find(|f| f.key == key)
    }

    /// Find a tab by key.
    #[must_use]
    pub fn find_tab(&self, key: &str) -> Option<&TableTab> {
        self.tabs.iter().find(|t| t.key == key)
    }

    /// Replace the options of a select filter, adding the filter if missing.
    #[must_use]
    pub fn with_options(mut self, key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        if let Some(filter) = self.filters.iter_mut().find(|f| f.key == key) {
            filter.options = options;
            self
        } else {
            self.filter(TableFilter::select(key, label, options))
        }
    }
}

// =============================================================================
// Grid Configurations
// =============================================================================

fn active_filter() -> TableFilter {
    TableFilter::select(
        "active",
        "Status",
        vec![
            FilterOption::new("true", "Active"),
            FilterOption::new("false", "Inactive"),
        ],
    )
}

fn active_tabs(config: DataTableConfig) -> DataTableConfig {
    config
        .tab(TableTab::all())
        .tab(TableTab::preset("active", "Active", "active", "true"))
        .tab(TableTab::preset("inactive", "Inactive", "active", "false"))
}

/// Build the inventory table configuration.
#[must_use]
pub fn inventory_table_config() -> DataTableConfig {
    DataTableConfig::new("inventory")
        .column(TableColumn::new("sku", "SKU"))
        .column(TableColumn::new("product_name", "Product"))
        .column(TableColumn::new("location", "Location"))
        .column(TableColumn::number("on_hand", "On hand"))
        .column(TableColumn::number("reserved", "Reserved"))
        .column(TableColumn::number("available_to_promise", "Available"))
        .column(TableColumn::number("incoming", "Incoming").visible(false))
        .column(TableColumn::number("damaged", "Damaged").visible(false))
        .filter(TableFilter::select(
            "status",
            "Stock",
            vec![
                FilterOption::new("in_stock", "In stock"),
                FilterOption::new("low_stock", "Low stock"),
                FilterOption::new("out_of_stock", "Out of stock"),
            ],
        ))
        .filter(TableFilter::text("location", "Location", "Warehouse or store"))
        .tab(TableTab::all())
        .tab(TableTab::preset("low", "Low stock", "status", "low_stock"))
        .tab(TableTab::preset("out", "Out of stock", "status", "out_of_stock"))
        .read_only()
        .search_placeholder("Search by SKU or product...")
        .empty_state(
            "ph-package",
            "No inventory found",
            Some("Try adjusting your search or filters"),
        )
}

/// Build the process groups table configuration.
#[must_use]
pub fn process_groups_table_config() -> DataTableConfig {
    active_tabs(
        DataTableConfig::new("process-groups")
            .column(TableColumn::new("code", "Code"))
            .column(TableColumn::new("name", "Name"))
            .column(TableColumn::new("description", "Description").visible(false))
            .column(TableColumn::boolean("active", "Active"))
            .filter(active_filter())
            .search_placeholder("Search process groups...")
            .empty_state("ph-stack", "No process groups yet", None),
    )
}

/// Build the processes table configuration.
///
/// The process group filter's options are filled in from the lookup cache.
#[must_use]
pub fn processes_table_config() -> DataTableConfig {
    active_tabs(
        DataTableConfig::new("processes")
            .column(TableColumn::new("code", "Code"))
            .column(TableColumn::new("name", "Name"))
            .column(TableColumn::new("process_group_name", "Process group"))
            .column(TableColumn::new("description", "Description").visible(false))
            .column(TableColumn::boolean("active", "Active"))
            .filter(active_filter())
            .search_placeholder("Search processes...")
            .empty_state("ph-flow-arrow", "No processes yet", None),
    )
}

/// Build the SOPs table configuration.
#[must_use]
pub fn sops_table_config() -> DataTableConfig {
    DataTableConfig::new("sops")
        .column(TableColumn::new("title", "Title"))
        .column(TableColumn::new("version", "Version"))
        .column(TableColumn::new("process_name", "Process"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::new("document_url", "Document").visible(false))
        .column(TableColumn::date("updated_at", "Updated"))
        .filter(TableFilter::select(
            "status",
            "Status",
            vec![
                FilterOption::new("draft", "Draft"),
                FilterOption::new("published", "Published"),
                FilterOption::new("retired", "Retired"),
            ],
        ))
        .tab(TableTab::all())
        .tab(TableTab::preset("published", "Published", "status", "published"))
        .tab(TableTab::preset("draft", "Drafts", "status", "draft"))
        .search_placeholder("Search SOPs...")
        .empty_state("ph-file-text", "No SOPs yet", None)
}

/// Build the functions table configuration.
#[must_use]
pub fn functions_table_config() -> DataTableConfig {
    active_tabs(
        DataTableConfig::new("functions")
            .column(TableColumn::new("code", "Code"))
            .column(TableColumn::new("name", "Name"))
            .column(TableColumn::new("description", "Description"))
            .column(TableColumn::boolean("active", "Active"))
            .filter(active_filter())
            .search_placeholder("Search functions...")
            .empty_state("ph-function", "No functions yet", None),
    )
}

/// Build the service categories table configuration.
#[must_use]
pub fn service_categories_table_config() -> DataTableConfig {
    active_tabs(
        DataTableConfig::new("service-categories")
            .column(TableColumn::new("code", "Code"))
            .column(TableColumn::new("name", "Name"))
            .column(TableColumn::number("sort_order", "Order"))
            .column(TableColumn::new("description", "Description").visible(false))
            .column(TableColumn::boolean("active", "Active"))
            .filter(active_filter())
            .search_placeholder("Search service categories...")
            .empty_state("ph-folders", "No service categories yet", None),
    )
}

/// Build the service subcategories table configuration.
///
/// The category filter's options are filled in from the lookup cache.
#[must_use]
pub fn service_subcategories_table_config() -> DataTableConfig {
    active_tabs(
        DataTableConfig::new("service-subcategories")
            .column(TableColumn::new("code", "Code"))
            .column(TableColumn::new("name", "Name"))
            .column(TableColumn::new("service_category_name", "Category"))
            .column(TableColumn::new("description", "Description").visible(false))
            .column(TableColumn::boolean("active", "Active"))
            .filter(active_filter())
            .search_placeholder("Search service subcategories...")
            .empty_state("ph-folder", "No service subcategories yet", None),
    )
}

/// Build the service user types table configuration.
#[must_use]
pub fn service_user_types_table_config() -> DataTableConfig {
    active_tabs(
        DataTableConfig::new("service-user-types")
            .column(TableColumn::new("code", "Code"))
            .column(TableColumn::new("name", "Name"))
            .column(TableColumn::new("description", "Description"))
            .column(TableColumn::boolean("active", "Active"))
            .filter(active_filter())
            .search_placeholder("Search user types...")
            .empty_state("ph-users-three", "No user types yet", None),
    )
}
