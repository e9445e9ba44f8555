//! Service-management configuration entities.
//!
//! Process groups, processes, SOPs, functions, service categories,
//! subcategories and user types all live in the remote API. Most of them
//! share the same code/name/description/active shape, captured by
//! [`Definition`].

use chrono::{DateTime, Utc};
use orchard_core::{
    FieldError, FunctionId, ProcessGroupId, ProcessId, ServiceCategoryId, ServiceSubcategoryId,
    ServiceUserTypeId, SopId,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::{Listing, Lookup, Resource};
use crate::components::{DataTableConfig, data_table};

/// Longest accepted name or title.
pub const MAX_NAME_LENGTH: usize = 120;
/// Longest accepted code.
pub const MAX_CODE_LENGTH: usize = 32;

const fn default_active() -> bool {
    true
}

// =============================================================================
// Shared fields
// =============================================================================

/// Fields shared by the simple configuration entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    /// Short unique code, e.g. `FUL` or `RET-01`.
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Definition {
    /// Validate the definition.
    ///
    /// # Errors
    ///
    /// Returns every offending field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_name("name", &self.name, &mut errors);
        check_code(&self.code, &mut errors);
        finish(errors)
    }
}

/// Partial update of a [`Definition`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl DefinitionPatch {
    fn check(&self, errors: &mut Vec<FieldError>) {
        if let Some(name) = &self.name {
            check_name("name", name, errors);
        }
        if let Some(code) = &self.code {
            check_code(code, errors);
        }
    }

    /// Validate the fields present in the patch.
    ///
    /// # Errors
    ///
    /// Returns every offending field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        self.check(&mut errors);
        finish(errors)
    }
}

fn check_name(field: &str, value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "is required"));
    } else if value.chars().count() > MAX_NAME_LENGTH {
        errors.push(FieldError::new(field, "is too long"));
    }
}

fn check_code(code: &str, errors: &mut Vec<FieldError>) {
    if code.is_empty() {
        errors.push(FieldError::new("code", "is required"));
    } else if code.len() > MAX_CODE_LENGTH {
        errors.push(FieldError::new("code", "is too long"));
    } else if !code
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        errors.push(FieldError::new(
            "code",
            "may only contain letters, digits, hyphens and underscores",
        ));
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

// =============================================================================
// Process groups
// =============================================================================

/// A group of related processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessGroup {
    pub id: ProcessGroupId,
    #[serde(flatten)]
    pub definition: Definition,
}

/// The `process-groups` collection.
pub struct ProcessGroups;

impl Listing for ProcessGroups {
    const PATH: &'static str = "process-groups";
    const TITLE: &'static str = "Process groups";
    type Record = ProcessGroup;

    fn table() -> DataTableConfig {
        data_table::process_groups_table_config()
    }
}

impl Resource for ProcessGroups {
    type Draft = Definition;
    type Patch = DefinitionPatch;

    fn validate_draft(draft: &Definition) -> Result<(), Vec<FieldError>> {
        draft.validate()
    }

    fn validate_patch(patch: &DefinitionPatch) -> Result<(), Vec<FieldError>> {
        patch.validate()
    }
}

// =============================================================================
// Processes
// =============================================================================

/// A process within a process group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub id: ProcessId,
    pub process_group_id: ProcessGroupId,
    /// Denormalized by the API for display.
    #[serde(default)]
    pub process_group_name: Option<String>,
    #[serde(flatten)]
    pub definition: Definition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDraft {
    pub process_group_id: ProcessGroupId,
    #[serde(flatten)]
    pub definition: Definition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_group_id: Option<ProcessGroupId>,
    #[serde(flatten)]
    pub definition: DefinitionPatch,
}

/// The `processes` collection.
pub struct Processes;

impl Listing for Processes {
    const PATH: &'static str = "processes";
    const TITLE: &'static str = "Processes";
    const LOOKUPS: &'static [Lookup] = &[Lookup {
        filter: "process_group_id",
        label: "Process group",
        source: ProcessGroups::PATH,
    }];
    type Record = Process;

    fn table() -> DataTableConfig {
        data_table::processes_table_config()
    }
}

impl Resource for Processes {
    type Draft = ProcessDraft;
    type Patch = ProcessPatch;

    fn validate_draft(draft: &ProcessDraft) -> Result<(), Vec<FieldError>> {
        draft.definition.validate()
    }

    fn validate_patch(patch: &ProcessPatch) -> Result<(), Vec<FieldError>> {
        patch.definition.validate()
    }
}

// =============================================================================
// SOPs
// =============================================================================

/// Lifecycle of a standard operating procedure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SopStatus {
    #[default]
    Draft,
    Published,
    Retired,
}

/// A standard operating procedure document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sop {
    pub id: SopId,
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub process_id: Option<ProcessId>,
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub status: SopStatus,
    #[serde(default)]
    pub document_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SopDraft {
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub process_id: Option<ProcessId>,
    #[serde(default)]
    pub status: SopStatus,
    #[serde(default)]
    pub document_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SopPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<ProcessId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SopStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}

fn check_version(version: &str, errors: &mut Vec<FieldError>) {
    if version.trim().is_empty() {
        errors.push(FieldError::new("version", "is required"));
    } else if version.len() > MAX_CODE_LENGTH {
        errors.push(FieldError::new("version", "is too long"));
    }
}

fn check_document_url(url: &str, errors: &mut Vec<FieldError>) {
    let valid = Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
    if !valid {
        errors.push(FieldError::new("document_url", "must be an http(s) link"));
    }
}

/// The `sops` collection.
pub struct Sops;

impl Listing for Sops {
    const PATH: &'static str = "sops";
    const TITLE: &'static str = "SOPs";
    const LOOKUPS: &'static [Lookup] = &[Lookup {
        filter: "process_id",
        label: "Process",
        source: Processes::PATH,
    }];
    type Record = Sop;

    fn table() -> DataTableConfig {
        data_table::sops_table_config()
    }
}

impl Resource for Sops {
    type Draft = SopDraft;
    type Patch = SopPatch;

    fn validate_draft(draft: &SopDraft) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_name("title", &draft.title, &mut errors);
        check_version(&draft.version, &mut errors);
        if let Some(url) = &draft.document_url {
            check_document_url(url, &mut errors);
        }
        finish(errors)
    }

    fn validate_patch(patch: &SopPatch) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(title) = &patch.title {
            check_name("title", title, &mut errors);
        }
        if let Some(version) = &patch.version {
            check_version(version, &mut errors);
        }
        if let Some(url) = &patch.document_url {
            check_document_url(url, &mut errors);
        }
        finish(errors)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// A business function that processes are performed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    #[serde(flatten)]
    pub definition: Definition,
}

/// The `functions` collection.
pub struct Functions;

impl Listing for Functions {
    const PATH: &'static str = "functions";
    const TITLE: &'static str = "Functions";
    type Record = Function;

    fn table() -> DataTableConfig {
        data_table::functions_table_config()
    }
}

impl Resource for Functions {
    type Draft = Definition;
    type Patch = DefinitionPatch;

    fn validate_draft(draft: &Definition) -> Result<(), Vec<FieldError>> {
        draft.validate()
    }

    fn validate_patch(patch: &DefinitionPatch) -> Result<(), Vec<FieldError>> {
        patch.validate()
    }
}

// =============================================================================
// Service categories
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: ServiceCategoryId,
    /// Position in category pickers, ascending.
    #[serde(default)]
    pub sort_order: i32,
    #[serde(flatten)]
    pub definition: Definition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategoryDraft {
    #[serde(default)]
    pub sort_order: i32,
    #[serde(flatten)]
    pub definition: Definition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(flatten)]
    pub definition: DefinitionPatch,
}

/// The `service-categories` collection.
pub struct ServiceCategories;

impl Listing for ServiceCategories {
    const PATH: &'static str = "service-categories";
    const TITLE: &'static str = "Service categories";
    type Record = ServiceCategory;

    fn table() -> DataTableConfig {
        data_table::service_categories_table_config()
    }
}

impl Resource for ServiceCategories {
    type Draft = ServiceCategoryDraft;
    type Patch = ServiceCategoryPatch;

    fn validate_draft(draft: &ServiceCategoryDraft) -> Result<(), Vec<FieldError>> {
        let mut errors = draft.definition.validate().err().unwrap_or_default();
        if draft.sort_order < 0 {
            errors.push(FieldError::new("sort_order", "cannot be negative"));
        }
        finish(errors)
    }

    fn validate_patch(patch: &ServiceCategoryPatch) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        patch.definition.check(&mut errors);
        if patch.sort_order.is_some_and(|order| order < 0) {
            errors.push(FieldError::new("sort_order", "cannot be negative"));
        }
        finish(errors)
    }
}

// =============================================================================
// Service subcategories
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSubcategory {
    pub id: ServiceSubcategoryId,
    pub service_category_id: ServiceCategoryId,
    #[serde(default)]
    pub service_category_name: Option<String>,
    #[serde(flatten)]
    pub definition: Definition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSubcategoryDraft {
    pub service_category_id: ServiceCategoryId,
    #[serde(flatten)]
    pub definition: Definition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSubcategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_category_id: Option<ServiceCategoryId>,
    #[serde(flatten)]
    pub definition: DefinitionPatch,
}

/// The `service-subcategories` collection.
pub struct ServiceSubcategories;

impl Listing for ServiceSubcategories {
    const PATH: &'static str = "service-subcategories";
    const TITLE: &'static str = "Service subcategories";
    const LOOKUPS: &'static [Lookup] = &[Lookup {
        filter: "service_category_id",
        label: "Category",
        source: ServiceCategories::PATH,
    }];
    type Record = ServiceSubcategory;

    fn table() -> DataTableConfig {
        data_table::service_subcategories_table_config()
    }
}

impl Resource for ServiceSubcategories {
    type Draft = ServiceSubcategoryDraft;
    type Patch = ServiceSubcategoryPatch;

    fn validate_draft(draft: &ServiceSubcategoryDraft) -> Result<(), Vec<FieldError>> {
        draft.definition.validate()
    }

    fn validate_patch(patch: &ServiceSubcategoryPatch) -> Result<(), Vec<FieldError>> {
        patch.definition.validate()
    }
}

// =============================================================================
// Service user types
// =============================================================================

/// A kind of user a service is offered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUserType {
    pub id: ServiceUserTypeId,
    #[serde(flatten)]
    pub definition: Definition,
}

/// The `service-user-types` collection.
pub struct ServiceUserTypes;

impl Listing for ServiceUserTypes {
    const PATH: &'static str = "service-user-types";
    const TITLE: &'static str = "Service user types";
    type Record = ServiceUserType;

    fn table() -> DataTableConfig {
        data_table::service_user_types_table_config()
    }
}

impl Resource for ServiceUserTypes {
    type Draft = Definition;
    type Patch = DefinitionPatch;

    fn validate_draft(draft: &Definition) -> Result<(), Vec<FieldError>> {
        draft.validate()
    }

    fn validate_patch(patch: &DefinitionPatch) -> Result<(), Vec<FieldError>> {
        patch.validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(name: &str, code: &str) -> Definition {
        Definition {
            name: name.to_string(),
            code: code.to_string(),
            description: None,
            active: true,
        }
    }

    #[test]
    fn test_definition_validation_reports_every_field() {
        assert!(definition("Fulfilment", "FUL").validate().is_ok());

        let errors = definition("  ", "has space").validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "code"]);

        let errors = definition("Ok", &"C".repeat(MAX_CODE_LENGTH + 1))
            .validate()
            .unwrap_err();
        assert_eq!(errors, vec![FieldError::new("code", "is too long")]);
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        assert!(DefinitionPatch::default().validate().is_ok());
        let patch = DefinitionPatch {
            name: Some(String::new()),
            ..DefinitionPatch::default()
        };
        assert_eq!(
            patch.validate().unwrap_err(),
            vec![FieldError::new("name", "is required")]
        );
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = ProcessPatch {
            process_group_id: Some(ProcessGroupId::new(3)),
            definition: DefinitionPatch {
                active: Some(false),
                ..DefinitionPatch::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"process_group_id": 3, "active": false})
        );
    }

    #[test]
    fn test_process_record_flattens_definition() {
        let process: Process = serde_json::from_value(json!({
            "id": 7,
            "process_group_id": 3,
            "process_group_name": "Fulfilment",
            "name": "Pick and pack",
            "code": "PICK"
        }))
        .unwrap();
        assert_eq!(process.definition.name, "Pick and pack");
        assert!(process.definition.active);
        assert_eq!(process.process_group_name.as_deref(), Some("Fulfilment"));
    }

    #[test]
    fn test_sop_validation() {
        let mut draft = SopDraft {
            title: "Receiving goods".to_string(),
            version: "1.2".to_string(),
            process_id: None,
            status: SopStatus::Draft,
            document_url: Some("https://docs.orchard.test/sop/12".to_string()),
        };
        assert!(Sops::validate_draft(&draft).is_ok());

        draft.document_url = Some("ftp://docs.orchard.test/sop/12".to_string());
        draft.version = String::new();
        let errors = Sops::validate_draft(&draft).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["version", "document_url"]);
    }

    #[test]
    fn test_category_sort_order_cannot_be_negative() {
        let draft = ServiceCategoryDraft {
            sort_order: -1,
            definition: definition("Repairs", "REP"),
        };
        assert_eq!(
            ServiceCategories::validate_draft(&draft).unwrap_err(),
            vec![FieldError::new("sort_order", "cannot be negative")]
        );
    }

    #[test]
    fn test_lookups_point_at_parent_collections() {
        assert_eq!(Processes::LOOKUPS[0].source, "process-groups");
        assert_eq!(Sops::LOOKUPS[0].source, "processes");
        assert_eq!(ServiceSubcategories::LOOKUPS[0].source, "service-categories");
        assert!(ProcessGroups::LOOKUPS.is_empty());
    }
}
