use serde::{Deserialize, Serialize};
use crate::state::{
    ApiKey, Binding, ColumnMaskSpec, ComputeAssignment, ComputeEndpoint, ExternalLocation,
    Grant, Group, Principal, PrivilegePreset, RowFilterSpec, StorageCredential, Tag,
    TagAssignment,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub deletion_protection: bool,
}

/// A document holding exactly one resource: `{apiVersion, kind, metadata, spec}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDoc<S> {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: S,
}

macro_rules! list_document {
    ($name:ident, $field:ident: $item:ty) => {
        #[derive(Debug, Clone, Default, Serialize, Deserialize)]
        pub struct $name {
            #[serde(rename = "apiVersion", default)]
            pub api_version: String,
            #[serde(default)]
            pub kind: String,
            #[serde(default)]
            pub $field: Vec<$item>,
        }
    };
}

list_document!(PrincipalListDoc, principals: Principal);
list_document!(GroupListDoc, groups: Group);
list_document!(GrantListDoc, grants: Grant);
list_document!(PresetListDoc, presets: PrivilegePreset);
list_document!(BindingListDoc, bindings: Binding);
list_document!(ApiKeyListDoc, api_keys: ApiKey);
list_document!(RowFilterListDoc, filters: RowFilterSpec);
list_document!(ColumnMaskListDoc, masks: ColumnMaskSpec);
list_document!(StorageCredentialListDoc, credentials: StorageCredential);
list_document!(ExternalLocationListDoc, locations: ExternalLocation);
list_document!(ComputeEndpointListDoc, endpoints: ComputeEndpoint);
list_document!(ComputeAssignmentListDoc, assignments: ComputeAssignment);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagConfigDoc {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub assignments: Vec<TagAssignment>,
}
