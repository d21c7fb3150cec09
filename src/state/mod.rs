mod security;
mod catalog;
mod governance;
mod infra;
mod workspace;

pub use security::{Principal, Group, Member, Grant, PrivilegePreset, Binding, ApiKey};
pub use catalog::{
    CatalogSpec, SchemaSpec, TableSpec, ColumnDef, ViewSpec, VolumeSpec,
    RowFilterSpec, FilterBinding, ColumnMaskSpec, MaskBinding,
    CatalogResource, SchemaResource, TableResource, ViewResource, VolumeResource,
    RowFilterSet, ColumnMaskSet,
};
pub use governance::{Tag, TagAssignment};
pub use infra::{
    StorageCredential, S3Credential, AzureCredential, GcsCredential,
    ExternalLocation, ComputeEndpoint, ComputeAssignment,
};
pub use workspace::{
    NotebookSpec, Cell, PipelineSpec, PipelineJob, ModelSpec, ModelConfig, Contract,
    ContractColumn, ModelTest, Freshness, MacroSpec,
    NotebookResource, PipelineResource, ModelResource, MacroResource,
};

/// The whole configuration of the platform. Desired and actual state share this type;
/// order within each list carries no meaning for diffing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub principals: Vec<Principal>,
    pub groups: Vec<Group>,
    pub grants: Vec<Grant>,
    pub privilege_presets: Vec<PrivilegePreset>,
    pub bindings: Vec<Binding>,
    pub api_keys: Vec<ApiKey>,
    pub catalogs: Vec<CatalogResource>,
    pub schemas: Vec<SchemaResource>,
    pub tables: Vec<TableResource>,
    pub views: Vec<ViewResource>,
    pub volumes: Vec<VolumeResource>,
    pub row_filters: Vec<RowFilterSet>,
    pub column_masks: Vec<ColumnMaskSet>,
    pub tags: Vec<Tag>,
    pub tag_assignments: Vec<TagAssignment>,
    pub storage_credentials: Vec<StorageCredential>,
    pub external_locations: Vec<ExternalLocation>,
    pub compute_endpoints: Vec<ComputeEndpoint>,
    pub compute_assignments: Vec<ComputeAssignment>,
    pub notebooks: Vec<NotebookResource>,
    pub pipelines: Vec<PipelineResource>,
    pub models: Vec<ModelResource>,
    pub macros: Vec<MacroResource>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_count(&self) -> usize {
        self.principals.len()
            + self.groups.len()
            + self.grants.len()
            + self.privilege_presets.len()
            + self.bindings.len()
            + self.api_keys.len()
            + self.catalogs.len()
            + self.schemas.len()
            + self.tables.len()
            + self.views.len()
            + self.volumes.len()
            + self.row_filters.iter().map(|s| s.filters.len()).sum::<usize>()
            + self.column_masks.iter().map(|s| s.masks.len()).sum::<usize>()
            + self.tags.len()
            + self.tag_assignments.len()
            + self.storage_credentials.len()
            + self.external_locations.len()
            + self.compute_endpoints.len()
            + self.compute_assignments.len()
            + self.notebooks.len()
            + self.pipelines.len()
            + self.models.len()
            + self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resource_count() == 0
    }

    pub fn find_table(&self, catalog: &str, schema: &str, table: &str) -> Option<&TableResource> {
        self.tables
            .iter()
            .find(|t| t.catalog == catalog && t.schema == schema && t.name == table)
    }
}
