use std::fmt;

pub const API_VERSION: &str = "duck/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    PrincipalList,
    GroupList,
    GrantList,
    PrivilegePresetList,
    BindingList,
    ApiKeyList,
    Catalog,
    Schema,
    Table,
    View,
    Volume,
    RowFilterList,
    ColumnMaskList,
    TagConfig,
    StorageCredentialList,
    ExternalLocationList,
    ComputeEndpointList,
    ComputeAssignmentList,
    Notebook,
    Pipeline,
    Model,
    Macro,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::PrincipalList => "PrincipalList",
            DocKind::GroupList => "GroupList",
            DocKind::GrantList => "GrantList",
            DocKind::PrivilegePresetList => "PrivilegePresetList",
            DocKind::BindingList => "BindingList",
            DocKind::ApiKeyList => "APIKeyList",
            DocKind::Catalog => "Catalog",
            DocKind::Schema => "Schema",
            DocKind::Table => "Table",
            DocKind::View => "View",
            DocKind::Volume => "Volume",
            DocKind::RowFilterList => "RowFilterList",
            DocKind::ColumnMaskList => "ColumnMaskList",
            DocKind::TagConfig => "TagConfig",
            DocKind::StorageCredentialList => "StorageCredentialList",
            DocKind::ExternalLocationList => "ExternalLocationList",
            DocKind::ComputeEndpointList => "ComputeEndpointList",
            DocKind::ComputeAssignmentList => "ComputeAssignmentList",
            DocKind::Notebook => "Notebook",
            DocKind::Pipeline => "Pipeline",
            DocKind::Model => "Model",
            DocKind::Macro => "Macro",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
