//! Reusable admin UI components.

pub mod data_table;

pub use data_table::{
    ColumnKind, DataTableConfig, FilterOption, FilterType, TableColumn, TableFilter, TableTab,
};
