//! Domain models for admin.
//!
//! Every record is owned by the remote API; these types only describe the
//! shapes the admin reads and writes, and which collection each grid uses.

pub mod inventory;
pub mod service;

pub use inventory::{Inventory, InventoryItem, StockStatus};
pub use service::{
    Definition, DefinitionPatch, Function, Functions, Process, ProcessDraft, ProcessGroup,
    ProcessGroups, ProcessPatch, Processes, ServiceCategories, ServiceCategory,
    ServiceCategoryDraft, ServiceCategoryPatch, ServiceSubcategories, ServiceSubcategory,
    ServiceSubcategoryDraft, ServiceSubcategoryPatch, ServiceUserType, ServiceUserTypes, Sop,
    SopDraft, SopPatch, SopStatus, Sops,
};
