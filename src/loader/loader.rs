use std::fs;
use std::path::{Path, PathBuf};
use glob::{glob, Pattern};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::Value;
use tracing::{debug, info, warn};
use crate::error::{LakePlanError, Result};
use crate::model::{DocKind, API_VERSION};
use crate::state::{
    CatalogResource, CatalogSpec, ColumnMaskSet, MacroResource, MacroSpec, ModelResource,
    ModelSpec, NotebookResource, NotebookSpec, PipelineResource, PipelineSpec, RowFilterSet,
    SchemaResource, SchemaSpec, State, TableResource, TableSpec, ViewResource, ViewSpec,
    VolumeResource, VolumeSpec,
};
use super::documents::{
    ApiKeyListDoc, BindingListDoc, ColumnMaskListDoc, ComputeAssignmentListDoc,
    ComputeEndpointListDoc, ExternalLocationListDoc, GrantListDoc, GroupListDoc, ObjectMeta,
    PresetListDoc, PrincipalListDoc, ResourceDoc, RowFilterListDoc, StorageCredentialListDoc,
    TagConfigDoc,
};
use super::paths;
use super::strict::unknown_fields;

const DIRECTORY: &str = "directory";
const FILE: &str = "file";

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Drop fields the schema does not know instead of failing the load.
    pub allow_unknown_fields: bool,
}

pub struct StateLoader {
    options: LoadOptions,
}

impl Default for StateLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl StateLoader {
    pub fn new() -> Self {
        Self::with_options(LoadOptions::default())
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn load_dir(&self, root: impl AsRef<Path>) -> Result<State> {
        let root = root.as_ref();
        let metadata = fs::metadata(root).map_err(|_| LakePlanError::NotFound(root.to_path_buf()))?;
        if !metadata.is_dir() {
            return Err(LakePlanError::NotADirectory(root.to_path_buf()));
        }

        let mut state = State::new();
        self.load_security(root, &mut state)?;
        self.load_governance(root, &mut state)?;
        self.load_storage(root, &mut state)?;
        self.load_compute(root, &mut state)?;
        self.load_catalogs(root, &mut state)?;
        self.load_notebooks(root, &mut state)?;
        self.load_pipelines(root, &mut state)?;
        self.load_models(root, &mut state)?;
        self.load_macros(root, &mut state)?;

        info!("Loaded {} resources from {}", state.resource_count(), root.display());
        Ok(state)
    }

    fn load_security(&self, root: &Path, state: &mut State) -> Result<()> {
        if let Some(doc) = self.read_document::<PrincipalListDoc>(&root.join(paths::PRINCIPALS), DocKind::PrincipalList)? {
            state.principals = doc.principals;
        }
        if let Some(doc) = self.read_document::<GroupListDoc>(&root.join(paths::GROUPS), DocKind::GroupList)? {
            state.groups = doc.groups;
        }
        if let Some(doc) = self.read_document::<GrantListDoc>(&root.join(paths::GRANTS), DocKind::GrantList)? {
            state.grants = doc.grants;
        }
        if let Some(doc) = self.read_document::<PresetListDoc>(&root.join(paths::PRIVILEGE_PRESETS), DocKind::PrivilegePresetList)? {
            state.privilege_presets = doc.presets;
        }
        if let Some(doc) = self.read_document::<BindingListDoc>(&root.join(paths::BINDINGS), DocKind::BindingList)? {
            state.bindings = doc.bindings;
        }
        if let Some(doc) = self.read_document::<ApiKeyListDoc>(&root.join(paths::API_KEYS), DocKind::ApiKeyList)? {
            state.api_keys = doc.api_keys;
        }
        Ok(())
    }

    fn load_governance(&self, root: &Path, state: &mut State) -> Result<()> {
        if let Some(doc) = self.read_document::<TagConfigDoc>(&root.join(paths::TAGS), DocKind::TagConfig)? {
            state.tags = doc.tags;
            state.tag_assignments = doc.assignments;
        }
        Ok(())
    }

    fn load_storage(&self, root: &Path, state: &mut State) -> Result<()> {
        if let Some(doc) = self.read_document::<StorageCredentialListDoc>(&root.join(paths::STORAGE_CREDENTIALS), DocKind::StorageCredentialList)? {
            state.storage_credentials = doc.credentials;
        }
        if let Some(doc) = self.read_document::<ExternalLocationListDoc>(&root.join(paths::EXTERNAL_LOCATIONS), DocKind::ExternalLocationList)? {
            state.external_locations = doc.locations;
        }
        Ok(())
    }

    fn load_compute(&self, root: &Path, state: &mut State) -> Result<()> {
        if let Some(doc) = self.read_document::<ComputeEndpointListDoc>(&root.join(paths::COMPUTE_ENDPOINTS), DocKind::ComputeEndpointList)? {
            state.compute_endpoints = doc.endpoints;
        }
        if let Some(doc) = self.read_document::<ComputeAssignmentListDoc>(&root.join(paths::COMPUTE_ASSIGNMENTS), DocKind::ComputeAssignmentList)? {
            state.compute_assignments = doc.assignments;
        }
        Ok(())
    }

    fn load_catalogs(&self, root: &Path, state: &mut State) -> Result<()> {
        for (catalog, catalog_dir) in subdirectories(&root.join("catalogs"))? {
            let file = catalog_dir.join("catalog.yaml");
            if let Some(doc) = self.read_resource::<CatalogSpec>(&file, DocKind::Catalog, &catalog, DIRECTORY)? {
                state.catalogs.push(CatalogResource {
                    name: catalog.clone(),
                    deletion_protection: doc.metadata.deletion_protection,
                    spec: doc.spec,
                });
            }

            for (schema, schema_dir) in subdirectories(&catalog_dir.join("schemas"))? {
                self.load_schema(&schema_dir, &catalog, &schema, state)?;
            }
        }
        Ok(())
    }

    fn load_schema(&self, dir: &Path, catalog: &str, schema: &str, state: &mut State) -> Result<()> {
        let file = dir.join("schema.yaml");
        if let Some(doc) = self.read_resource::<SchemaSpec>(&file, DocKind::Schema, schema, DIRECTORY)? {
            state.schemas.push(SchemaResource {
                catalog: catalog.to_string(),
                name: schema.to_string(),
                deletion_protection: doc.metadata.deletion_protection,
                spec: doc.spec,
            });
        }

        for (table, table_dir) in subdirectories(&dir.join("tables"))? {
            self.load_table(&table_dir, catalog, schema, &table, state)?;
        }

        for (view, file) in yaml_files(&dir.join("views"))? {
            if let Some(doc) = self.read_resource::<ViewSpec>(&file, DocKind::View, &view, FILE)? {
                state.views.push(ViewResource {
                    catalog: catalog.to_string(),
                    schema: schema.to_string(),
                    name: view,
                    deletion_protection: doc.metadata.deletion_protection,
                    spec: doc.spec,
                });
            }
        }

        for (volume, file) in yaml_files(&dir.join("volumes"))? {
            if let Some(doc) = self.read_resource::<VolumeSpec>(&file, DocKind::Volume, &volume, FILE)? {
                state.volumes.push(VolumeResource {
                    catalog: catalog.to_string(),
                    schema: schema.to_string(),
                    name: volume,
                    deletion_protection: doc.metadata.deletion_protection,
                    spec: doc.spec,
                });
            }
        }

        Ok(())
    }

    fn load_table(&self, dir: &Path, catalog: &str, schema: &str, table: &str, state: &mut State) -> Result<()> {
        let file = dir.join("table.yaml");
        if let Some(doc) = self.read_resource::<TableSpec>(&file, DocKind::Table, table, DIRECTORY)? {
            state.tables.push(TableResource {
                catalog: catalog.to_string(),
                schema: schema.to_string(),
                name: table.to_string(),
                deletion_protection: doc.metadata.deletion_protection,
                spec: doc.spec,
            });
        }

        if let Some(doc) = self.read_document::<RowFilterListDoc>(&dir.join("row-filters.yaml"), DocKind::RowFilterList)? {
            state.row_filters.push(RowFilterSet {
                catalog: catalog.to_string(),
                schema: schema.to_string(),
                table: table.to_string(),
                filters: doc.filters,
            });
        }

        if let Some(doc) = self.read_document::<ColumnMaskListDoc>(&dir.join("column-masks.yaml"), DocKind::ColumnMaskList)? {
            state.column_masks.push(ColumnMaskSet {
                catalog: catalog.to_string(),
                schema: schema.to_string(),
                table: table.to_string(),
                masks: doc.masks,
            });
        }

        Ok(())
    }

    fn load_notebooks(&self, root: &Path, state: &mut State) -> Result<()> {
        for (name, file) in yaml_files(&root.join("notebooks"))? {
            if let Some(doc) = self.read_resource::<NotebookSpec>(&file, DocKind::Notebook, &name, FILE)? {
                state.notebooks.push(NotebookResource {
                    name,
                    deletion_protection: doc.metadata.deletion_protection,
                    spec: doc.spec,
                });
            }
        }
        Ok(())
    }

    fn load_pipelines(&self, root: &Path, state: &mut State) -> Result<()> {
        for (name, file) in yaml_files(&root.join("pipelines"))? {
            if let Some(doc) = self.read_resource::<PipelineSpec>(&file, DocKind::Pipeline, &name, FILE)? {
                state.pipelines.push(PipelineResource {
                    name,
                    deletion_protection: doc.metadata.deletion_protection,
                    spec: doc.spec,
                });
            }
        }
        Ok(())
    }

    fn load_models(&self, root: &Path, state: &mut State) -> Result<()> {
        for (project, project_dir) in subdirectories(&root.join("models"))? {
            let pattern = format!("{}/**/*.yaml", Pattern::escape(&project_dir.to_string_lossy()));
            let files: Vec<PathBuf> = glob(&pattern)?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();

            for file in files {
                let Some(name) = file_stem(&file) else {
                    continue;
                };
                if let Some(doc) = self.read_resource::<ModelSpec>(&file, DocKind::Model, &name, FILE)? {
                    state.models.push(ModelResource {
                        project: project.clone(),
                        name,
                        deletion_protection: doc.metadata.deletion_protection,
                        spec: doc.spec,
                    });
                }
            }
        }
        Ok(())
    }

    fn load_macros(&self, root: &Path, state: &mut State) -> Result<()> {
        for (name, file) in yaml_files(&root.join("macros"))? {
            if let Some(doc) = self.read_resource::<MacroSpec>(&file, DocKind::Macro, &name, FILE)? {
                state.macros.push(MacroResource {
                    name,
                    deletion_protection: doc.metadata.deletion_protection,
                    spec: doc.spec,
                });
            }
        }
        Ok(())
    }

    fn read_resource<S>(
        &self,
        path: &Path,
        kind: DocKind,
        expected_name: &str,
        location: &'static str,
    ) -> Result<Option<ResourceDoc<S>>>
    where
        S: DeserializeOwned + Serialize + Default,
    {
        let Some(doc) = self.read_document::<ResourceDoc<S>>(path, kind)? else {
            return Ok(None);
        };
        check_name(path, &doc.metadata, expected_name, location)?;
        Ok(Some(doc))
    }

    /// Reads one document. A missing file is not an error.
    fn read_document<D>(&self, path: &Path, kind: DocKind) -> Result<Option<D>>
    where
        D: DeserializeOwned + Serialize,
    {
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| LakePlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: Value = serde_yaml::from_str(&content).map_err(|source| LakePlanError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        check_envelope(path, &raw, kind)?;

        let doc: D = serde_yaml::from_value(raw.clone()).map_err(|source| LakePlanError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let unknown = unknown_fields(&raw, &serde_yaml::to_value(&doc)?);
        if !unknown.is_empty() {
            if !self.options.allow_unknown_fields {
                return Err(LakePlanError::UnknownFields {
                    path: path.to_path_buf(),
                    fields: unknown,
                });
            }
            warn!("{}: ignoring unknown field(s): {}", path.display(), unknown.join(", "));
        }

        debug!("Loaded {} document {}", kind, path.display());
        Ok(Some(doc))
    }
}

fn check_envelope(path: &Path, raw: &Value, expected: DocKind) -> Result<()> {
    let api_version = raw.get("apiVersion").and_then(Value::as_str).unwrap_or_default();
    if api_version != API_VERSION {
        return Err(LakePlanError::UnsupportedApiVersion {
            path: path.to_path_buf(),
            found: api_version.to_string(),
            expected: API_VERSION,
        });
    }

    let kind = raw.get("kind").and_then(Value::as_str).unwrap_or_default();
    if kind != expected.as_str() {
        return Err(LakePlanError::UnexpectedKind {
            path: path.to_path_buf(),
            found: kind.to_string(),
            expected: expected.as_str(),
        });
    }

    Ok(())
}

fn check_name(path: &Path, meta: &ObjectMeta, expected: &str, location: &'static str) -> Result<()> {
    if meta.name != expected {
        return Err(LakePlanError::NameMismatch {
            path: path.to_path_buf(),
            name: meta.name.clone(),
            expected: expected.to_string(),
            location,
        });
    }
    Ok(())
}

fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    Ok(glob(&pattern)?.filter_map(|r| r.ok()).collect())
}

fn subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    Ok(list_entries(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .filter_map(|p| {
            let name = p.file_name()?.to_str()?.to_string();
            Some((name, p))
        })
        .collect())
}

/// One-resource-per-file directories: `<name>.yaml`, anything else is skipped.
fn yaml_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for path in list_entries(dir)? {
        if path.is_dir() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            debug!("Skipping non-YAML file {}", path.display());
            continue;
        }
        if let Some(name) = file_stem(&path) {
            files.push((name, path));
        }
    }
    Ok(files)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()?.to_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = StateLoader::new().load_dir(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, LakePlanError::NotFound(_)));
    }

    #[test]
    fn test_root_is_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "file.yaml", "x: 1");
        let err = StateLoader::new().load_dir(dir.path().join("file.yaml")).unwrap_err();
        assert!(matches!(err, LakePlanError::NotADirectory(_)));
    }

    #[test]
    fn test_yaml_files_skips_other_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "views/a.yaml", "");
        write(dir.path(), "views/README.md", "");
        write(dir.path(), "views/b.yml", "");
        let files = yaml_files(&dir.path().join("views")).unwrap();
        let names: Vec<&str> = files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_subdirectories_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("c/zeta")).unwrap();
        fs::create_dir_all(dir.path().join("c/alpha")).unwrap();
        write(dir.path(), "c/file.yaml", "");
        let names: Vec<String> = subdirectories(&dir.path().join("c"))
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_lenient_mode_drops_unknown_fields() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "security/principals.yaml",
            "apiVersion: duck/v1\nkind: PrincipalList\nprincipals:\n  - name: alice\n    type: user\n    team: data\n",
        );

        assert!(StateLoader::new().load_dir(dir.path()).is_err());

        let loader = StateLoader::with_options(LoadOptions { allow_unknown_fields: true });
        let state = loader.load_dir(dir.path()).unwrap();
        assert_eq!(state.principals.len(), 1);
        assert_eq!(state.principals[0].name, "alice");
    }
}
