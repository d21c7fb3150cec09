use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSpec {
    pub metastore_type: String,
    pub dsn: String,
    pub data_path: String,
    pub is_default: bool,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSpec {
    pub comment: String,
    pub owner: String,
    pub location_name: String,
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSpec {
    pub table_type: String,
    pub comment: String,
    pub owner: String,
    pub columns: Vec<ColumnDef>,
    pub properties: BTreeMap<String, String>,
    pub source_path: String,
    pub file_format: String,
    pub location_name: String,
}

impl TableSpec {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn with_column(mut self, name: impl Into<String>, column_type: impl Into<String>) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            column_type: column_type.into(),
            comment: String::new(),
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSpec {
    pub view_definition: String,
    pub comment: String,
    pub owner: String,
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeSpec {
    pub volume_type: String,
    pub storage_location: String,
    pub comment: String,
    pub owner: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowFilterSpec {
    pub name: String,
    pub filter_sql: String,
    pub description: String,
    pub bindings: Vec<FilterBinding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterBinding {
    pub principal: String,
    pub principal_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMaskSpec {
    pub name: String,
    pub column_name: String,
    pub mask_expression: String,
    pub description: String,
    pub bindings: Vec<MaskBinding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskBinding {
    pub principal: String,
    pub principal_type: String,
    pub see_original: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogResource {
    pub name: String,
    pub deletion_protection: bool,
    pub spec: CatalogSpec,
}

impl CatalogResource {
    pub fn new(name: impl Into<String>, spec: CatalogSpec) -> Self {
        Self {
            name: name.into(),
            deletion_protection: false,
            spec,
        }
    }

    pub fn protected(mut self) -> Self {
        self.deletion_protection = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaResource {
    pub catalog: String,
    pub name: String,
    pub deletion_protection: bool,
    pub spec: SchemaSpec,
}

impl SchemaResource {
    pub fn new(catalog: impl Into<String>, name: impl Into<String>, spec: SchemaSpec) -> Self {
        Self {
            catalog: catalog.into(),
            name: name.into(),
            deletion_protection: false,
            spec,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.catalog, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableResource {
    pub catalog: String,
    pub schema: String,
    pub name: String,
    pub deletion_protection: bool,
    pub spec: TableSpec,
}

impl TableResource {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
        spec: TableSpec,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            name: name.into(),
            deletion_protection: false,
            spec,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewResource {
    pub catalog: String,
    pub schema: String,
    pub name: String,
    pub deletion_protection: bool,
    pub spec: ViewSpec,
}

impl ViewResource {
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeResource {
    pub catalog: String,
    pub schema: String,
    pub name: String,
    pub deletion_protection: bool,
    pub spec: VolumeSpec,
}

impl VolumeResource {
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.name)
    }
}

/// Row filters declared for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilterSet {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub filters: Vec<RowFilterSpec>,
}

impl RowFilterSet {
    pub fn table_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

/// Column masks declared for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMaskSet {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub masks: Vec<ColumnMaskSpec>,
}

impl ColumnMaskSet {
    pub fn table_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.table)
    }
}
