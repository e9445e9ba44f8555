//! Inventory records (read-only).

use orchard_core::InventoryItemId;
use serde::{Deserialize, Serialize};

use crate::api::Listing;
use crate::components::{DataTableConfig, data_table};

/// Items at or below this many available units are highlighted.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Stock counters for one SKU at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub sku: String,
    pub product_name: String,
    pub location: String,
    pub on_hand: i64,
    #[serde(default)]
    pub reserved: i64,
    /// On hand minus reserved, as computed by the API.
    pub available_to_promise: i64,
    #[serde(default)]
    pub incoming: i64,
    #[serde(default)]
    pub damaged: i64,
}

/// Stock level bucket, matching the listing's `status` filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// Row CSS class for the grid, if the row should stand out.
    #[must_use]
    pub const fn row_class(self) -> Option<&'static str> {
        match self {
            Self::InStock => None,
            Self::LowStock => Some("low-stock"),
            Self::OutOfStock => Some("out-of-stock"),
        }
    }
}

impl InventoryItem {
    #[must_use]
    pub const fn stock_status(&self) -> StockStatus {
        if self.available_to_promise <= 0 {
            StockStatus::OutOfStock
        } else if self.available_to_promise <= LOW_STOCK_THRESHOLD {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// The `inventory` collection.
pub struct Inventory;

impl Listing for Inventory {
    const PATH: &'static str = "inventory";
    const TITLE: &'static str = "Inventory";
    type Record = InventoryItem;

    fn table() -> DataTableConfig {
        data_table::inventory_table_config()
    }

    fn row_class(record: &InventoryItem) -> Option<&'static str> {
        record.stock_status().row_class()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(available: i64) -> InventoryItem {
        serde_json::from_value(json!({
            "id": 1,
            "sku": "APL-GALA-1KG",
            "product_name": "Gala apples 1kg",
            "location": "North warehouse",
            "on_hand": available + 2,
            "reserved": 2,
            "available_to_promise": available
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let item = item(40);
        assert_eq!(item.incoming, 0);
        assert_eq!(item.damaged, 0);
    }

    #[test]
    fn test_stock_status_buckets() {
        assert_eq!(item(0).stock_status(), StockStatus::OutOfStock);
        assert_eq!(item(-3).stock_status(), StockStatus::OutOfStock);
        assert_eq!(item(LOW_STOCK_THRESHOLD).stock_status(), StockStatus::LowStock);
        assert_eq!(item(LOW_STOCK_THRESHOLD + 1).stock_status(), StockStatus::InStock);
        assert_eq!(Inventory::row_class(&item(0)), Some("out-of-stock"));
        assert_eq!(Inventory::row_class(&item(50)), None);
    }
}
