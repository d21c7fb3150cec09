use serde::{Serialize, Serializer};
use std::fmt;

pub const MAX_LAYER: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    StorageCredential,
    Principal,
    Tag,
    Group,
    ExternalLocation,
    ComputeEndpoint,
    GroupMembership,
    CatalogRegistration,
    Schema,
    ComputeAssignment,
    Table,
    View,
    Volume,
    PrivilegeGrant,
    TagAssignment,
    RowFilter,
    ColumnMask,
    Macro,
    RowFilterBinding,
    ColumnMaskBinding,
    ApiKey,
    Notebook,
    Model,
    Pipeline,
    PipelineJob,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 25] = [
        ResourceKind::StorageCredential,
        ResourceKind::Principal,
        ResourceKind::Tag,
        ResourceKind::Group,
        ResourceKind::ExternalLocation,
        ResourceKind::ComputeEndpoint,
        ResourceKind::GroupMembership,
        ResourceKind::CatalogRegistration,
        ResourceKind::Schema,
        ResourceKind::ComputeAssignment,
        ResourceKind::Table,
        ResourceKind::View,
        ResourceKind::Volume,
        ResourceKind::PrivilegeGrant,
        ResourceKind::TagAssignment,
        ResourceKind::RowFilter,
        ResourceKind::ColumnMask,
        ResourceKind::Macro,
        ResourceKind::RowFilterBinding,
        ResourceKind::ColumnMaskBinding,
        ResourceKind::ApiKey,
        ResourceKind::Notebook,
        ResourceKind::Model,
        ResourceKind::Pipeline,
        ResourceKind::PipelineJob,
    ];

    /// Dependency depth: a kind only depends on kinds with a strictly lower layer.
    pub fn layer(&self) -> u8 {
        match self {
            ResourceKind::StorageCredential | ResourceKind::Principal | ResourceKind::Tag => 0,
            ResourceKind::Group | ResourceKind::ExternalLocation | ResourceKind::ComputeEndpoint => 1,
            ResourceKind::GroupMembership | ResourceKind::CatalogRegistration => 2,
            ResourceKind::Schema | ResourceKind::ComputeAssignment => 3,
            ResourceKind::Table | ResourceKind::View | ResourceKind::Volume => 4,
            ResourceKind::PrivilegeGrant
            | ResourceKind::TagAssignment
            | ResourceKind::RowFilter
            | ResourceKind::ColumnMask
            | ResourceKind::Macro => 5,
            ResourceKind::RowFilterBinding
            | ResourceKind::ColumnMaskBinding
            | ResourceKind::ApiKey
            | ResourceKind::Notebook
            | ResourceKind::Model => 6,
            ResourceKind::Pipeline | ResourceKind::PipelineJob => 7,
        }
    }

    /// Kinds that only exist inside a parent resource of the same or lower layer.
    pub fn is_child(&self) -> bool {
        matches!(
            self,
            ResourceKind::GroupMembership
                | ResourceKind::RowFilterBinding
                | ResourceKind::ColumnMaskBinding
                | ResourceKind::PipelineJob
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::StorageCredential => "storage-credential",
            ResourceKind::Principal => "principal",
            ResourceKind::Tag => "tag",
            ResourceKind::Group => "group",
            ResourceKind::ExternalLocation => "external-location",
            ResourceKind::ComputeEndpoint => "compute-endpoint",
            ResourceKind::GroupMembership => "group-membership",
            ResourceKind::CatalogRegistration => "catalog-registration",
            ResourceKind::Schema => "schema",
            ResourceKind::ComputeAssignment => "compute-assignment",
            ResourceKind::Table => "table",
            ResourceKind::View => "view",
            ResourceKind::Volume => "volume",
            ResourceKind::PrivilegeGrant => "privilege-grant",
            ResourceKind::TagAssignment => "tag-assignment",
            ResourceKind::RowFilter => "row-filter",
            ResourceKind::ColumnMask => "column-mask",
            ResourceKind::Macro => "macro",
            ResourceKind::RowFilterBinding => "row-filter-binding",
            ResourceKind::ColumnMaskBinding => "column-mask-binding",
            ResourceKind::ApiKey => "api-key",
            ResourceKind::Notebook => "notebook",
            ResourceKind::Model => "model",
            ResourceKind::Pipeline => "pipeline",
            ResourceKind::PipelineJob => "pipeline-job",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Create => "+",
            Operation::Update => "~",
            Operation::Delete => "-",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_layers_within_bounds() {
        for kind in ResourceKind::ALL {
            assert!(kind.layer() <= MAX_LAYER, "{} out of range", kind);
        }
    }

    #[test]
    fn test_children_sit_above_parents() {
        assert!(ResourceKind::GroupMembership.layer() > ResourceKind::Group.layer());
        assert!(ResourceKind::RowFilterBinding.layer() > ResourceKind::RowFilter.layer());
        assert!(ResourceKind::ColumnMaskBinding.layer() > ResourceKind::ColumnMask.layer());
        assert!(ResourceKind::PipelineJob.layer() >= ResourceKind::Pipeline.layer());
        assert!(ResourceKind::Table.layer() > ResourceKind::Schema.layer());
        assert!(ResourceKind::Model.layer() > ResourceKind::Macro.layer());
    }

    #[test]
    fn test_tags_unique() {
        let tags: HashSet<&str> = ResourceKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(tags.len(), ResourceKind::ALL.len());
    }

    #[test]
    fn test_operation_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Operation::Update).unwrap(), "\"update\"");
        assert_eq!(serde_json::to_string(&ResourceKind::PrivilegeGrant).unwrap(), "\"privilege-grant\"");
    }
}
