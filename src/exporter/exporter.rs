use std::fs;
use std::path::Path;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};
use crate::error::{LakePlanError, Result};
use crate::loader::documents::{
    ApiKeyListDoc, BindingListDoc, ColumnMaskListDoc, ComputeAssignmentListDoc,
    ComputeEndpointListDoc, ExternalLocationListDoc, GrantListDoc, GroupListDoc, ObjectMeta,
    PresetListDoc, PrincipalListDoc, ResourceDoc, RowFilterListDoc, StorageCredentialListDoc,
    TagConfigDoc,
};
use crate::loader::paths;
use crate::model::{DocKind, API_VERSION};
use crate::state::State;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Write into a directory that already has content.
    pub overwrite: bool,
}

pub struct StateExporter {
    options: ExportOptions,
}

impl Default for StateExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StateExporter {
    pub fn new() -> Self {
        Self::with_options(ExportOptions::default())
    }

    pub fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Writes one document per resource at the path the loader reads it from.
    /// Returns the number of files written.
    pub fn export_dir(&self, state: &State, root: impl AsRef<Path>) -> Result<usize> {
        let root = root.as_ref();
        self.prepare_target(root)?;

        let mut writer = DocumentWriter { root, written: 0 };
        write_security(&mut writer, state)?;
        write_governance(&mut writer, state)?;
        write_storage_and_compute(&mut writer, state)?;
        write_catalogs(&mut writer, state)?;
        write_workspace(&mut writer, state)?;

        info!("Exported {} documents to {}", writer.written, root.display());
        Ok(writer.written)
    }

    fn prepare_target(&self, root: &Path) -> Result<()> {
        if !root.exists() {
            fs::create_dir_all(root)?;
            return Ok(());
        }
        if !root.is_dir() {
            return Err(LakePlanError::NotADirectory(root.to_path_buf()));
        }
        let has_content = fs::read_dir(root)?.next().is_some();
        if has_content && !self.options.overwrite {
            return Err(LakePlanError::ExportTargetNotEmpty(root.to_path_buf()));
        }
        Ok(())
    }
}

struct DocumentWriter<'a> {
    root: &'a Path,
    written: usize,
}

impl DocumentWriter<'_> {
    fn write<D: Serialize>(&mut self, rel: &str, doc: &D) -> Result<()> {
        let mut value = serde_yaml::to_value(doc)?;
        prune(&mut value);

        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_yaml::to_string(&value)?)?;
        debug!("Wrote {}", path.display());
        self.written += 1;
        Ok(())
    }

    fn write_resource<S: Serialize + Clone>(
        &mut self,
        rel: &str,
        kind: DocKind,
        name: &str,
        deletion_protection: bool,
        spec: &S,
    ) -> Result<()> {
        let doc = ResourceDoc {
            api_version: API_VERSION.to_string(),
            kind: kind.as_str().to_string(),
            metadata: ObjectMeta {
                name: name.to_string(),
                deletion_protection,
            },
            spec: spec.clone(),
        };
        self.write(rel, &doc)
    }
}

fn header(kind: DocKind) -> (String, String) {
    (API_VERSION.to_string(), kind.as_str().to_string())
}

fn write_security(w: &mut DocumentWriter<'_>, state: &State) -> Result<()> {
    if !state.principals.is_empty() {
        let (api_version, kind) = header(DocKind::PrincipalList);
        w.write(paths::PRINCIPALS, &PrincipalListDoc { api_version, kind, principals: state.principals.clone() })?;
    }
    if !state.groups.is_empty() {
        let (api_version, kind) = header(DocKind::GroupList);
        w.write(paths::GROUPS, &GroupListDoc { api_version, kind, groups: state.groups.clone() })?;
    }
    if !state.grants.is_empty() {
        let (api_version, kind) = header(DocKind::GrantList);
        w.write(paths::GRANTS, &GrantListDoc { api_version, kind, grants: state.grants.clone() })?;
    }
    if !state.privilege_presets.is_empty() {
        let (api_version, kind) = header(DocKind::PrivilegePresetList);
        w.write(paths::PRIVILEGE_PRESETS, &PresetListDoc { api_version, kind, presets: state.privilege_presets.clone() })?;
    }
    if !state.bindings.is_empty() {
        let (api_version, kind) = header(DocKind::BindingList);
        w.write(paths::BINDINGS, &BindingListDoc { api_version, kind, bindings: state.bindings.clone() })?;
    }
    if !state.api_keys.is_empty() {
        let (api_version, kind) = header(DocKind::ApiKeyList);
        w.write(paths::API_KEYS, &ApiKeyListDoc { api_version, kind, api_keys: state.api_keys.clone() })?;
    }
    Ok(())
}

fn write_governance(w: &mut DocumentWriter<'_>, state: &State) -> Result<()> {
    if state.tags.is_empty() && state.tag_assignments.is_empty() {
        return Ok(());
    }
    let (api_version, kind) = header(DocKind::TagConfig);
    w.write(
        paths::TAGS,
        &TagConfigDoc {
            api_version,
            kind,
            tags: state.tags.clone(),
            assignments: state.tag_assignments.clone(),
        },
    )
}

fn write_storage_and_compute(w: &mut DocumentWriter<'_>, state: &State) -> Result<()> {
    if !state.storage_credentials.is_empty() {
        let (api_version, kind) = header(DocKind::StorageCredentialList);
        w.write(paths::STORAGE_CREDENTIALS, &StorageCredentialListDoc { api_version, kind, credentials: state.storage_credentials.clone() })?;
    }
    if !state.external_locations.is_empty() {
        let (api_version, kind) = header(DocKind::ExternalLocationList);
        w.write(paths::EXTERNAL_LOCATIONS, &ExternalLocationListDoc { api_version, kind, locations: state.external_locations.clone() })?;
    }
    if !state.compute_endpoints.is_empty() {
        let (api_version, kind) = header(DocKind::ComputeEndpointList);
        w.write(paths::COMPUTE_ENDPOINTS, &ComputeEndpointListDoc { api_version, kind, endpoints: state.compute_endpoints.clone() })?;
    }
    if !state.compute_assignments.is_empty() {
        let (api_version, kind) = header(DocKind::ComputeAssignmentList);
        w.write(paths::COMPUTE_ASSIGNMENTS, &ComputeAssignmentListDoc { api_version, kind, assignments: state.compute_assignments.clone() })?;
    }
    Ok(())
}

fn write_catalogs(w: &mut DocumentWriter<'_>, state: &State) -> Result<()> {
    for c in &state.catalogs {
        w.write_resource(&paths::catalog(&c.name), DocKind::Catalog, &c.name, c.deletion_protection, &c.spec)?;
    }
    for s in &state.schemas {
        w.write_resource(&paths::schema(&s.catalog, &s.name), DocKind::Schema, &s.name, s.deletion_protection, &s.spec)?;
    }
    for t in &state.tables {
        w.write_resource(&paths::table(&t.catalog, &t.schema, &t.name), DocKind::Table, &t.name, t.deletion_protection, &t.spec)?;
    }
    for v in &state.views {
        w.write_resource(&paths::view(&v.catalog, &v.schema, &v.name), DocKind::View, &v.name, v.deletion_protection, &v.spec)?;
    }
    for v in &state.volumes {
        w.write_resource(&paths::volume(&v.catalog, &v.schema, &v.name), DocKind::Volume, &v.name, v.deletion_protection, &v.spec)?;
    }
    for set in state.row_filters.iter().filter(|s| !s.filters.is_empty()) {
        let (api_version, kind) = header(DocKind::RowFilterList);
        w.write(
            &paths::row_filters(&set.catalog, &set.schema, &set.table),
            &RowFilterListDoc { api_version, kind, filters: set.filters.clone() },
        )?;
    }
    for set in state.column_masks.iter().filter(|s| !s.masks.is_empty()) {
        let (api_version, kind) = header(DocKind::ColumnMaskList);
        w.write(
            &paths::column_masks(&set.catalog, &set.schema, &set.table),
            &ColumnMaskListDoc { api_version, kind, masks: set.masks.clone() },
        )?;
    }
    Ok(())
}

fn write_workspace(w: &mut DocumentWriter<'_>, state: &State) -> Result<()> {
    for n in &state.notebooks {
        w.write_resource(&paths::notebook(&n.name), DocKind::Notebook, &n.name, n.deletion_protection, &n.spec)?;
    }
    for p in &state.pipelines {
        w.write_resource(&paths::pipeline(&p.name), DocKind::Pipeline, &p.name, p.deletion_protection, &p.spec)?;
    }
    for m in &state.models {
        w.write_resource(&paths::model(&m.project, &m.name), DocKind::Model, &m.name, m.deletion_protection, &m.spec)?;
    }
    for m in &state.macros {
        w.write_resource(&paths::macro_def(&m.name), DocKind::Macro, &m.name, m.deletion_protection, &m.spec)?;
    }
    Ok(())
}

/// Record fields holding user-keyed maps. Their entries are data, not defaults.
const FREE_FORM_KEYS: &[&str] = &["properties"];

/// Drops default-valued entries so exported documents read like hand-written ones.
///
/// A mapping entry goes when its value is null, an empty string, `false`, an empty
/// sequence or an empty mapping. A mapping that only becomes empty after its own
/// entries are dropped stays as `{}`, so a present-but-default sub-object still
/// loads back as present. Numbers and sequence items are never dropped, and the
/// contents of [`FREE_FORM_KEYS`] maps are written untouched.
fn prune(value: &mut Value) {
    match value {
        Value::Mapping(map) => {
            let entries = std::mem::take(map);
            let mut kept = Mapping::new();
            for (key, mut entry) in entries {
                if is_blank(&entry) {
                    continue;
                }
                if !is_free_form(&key) {
                    prune(&mut entry);
                }
                kept.insert(key, entry);
            }
            *map = kept;
        }
        Value::Sequence(items) => items.iter_mut().for_each(prune),
        _ => {}
    }
}

fn is_free_form(key: &Value) -> bool {
    key.as_str().is_some_and(|k| FREE_FORM_KEYS.contains(&k))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CatalogResource, CatalogSpec, Principal};
    use tempfile::TempDir;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_prune_drops_defaults() {
        let mut value = yaml("name: a\ncomment: ''\nread_only: false\ncols: []\nopt: ~\nsize: 0");
        prune(&mut value);
        assert_eq!(value, yaml("name: a\nsize: 0"));
    }

    #[test]
    fn test_prune_keeps_emptied_mappings() {
        let mut value = yaml("gcs:\n  key_file_path: ''\nempty: {}");
        prune(&mut value);
        assert_eq!(value, yaml("gcs: {}"));
    }

    #[test]
    fn test_prune_keeps_sequence_items() {
        let mut value = yaml("items:\n  - ''\n  - name: x\n    flag: false");
        prune(&mut value);
        assert_eq!(value, yaml("items:\n  - ''\n  - name: x"));
    }

    #[test]
    fn test_prune_keeps_empty_property_values() {
        let mut value = yaml("comment: ''\nproperties:\n  owner_team: ''\n  env: prod");
        prune(&mut value);
        assert_eq!(value, yaml("properties:\n  owner_team: ''\n  env: prod"));
    }

    #[test]
    fn test_empty_state_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let written = StateExporter::new().export_dir(&State::new(), dir.path()).unwrap();
        assert_eq!(written, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_refuses_non_empty_target() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("existing.txt"), "data").unwrap();

        let mut state = State::new();
        state.principals.push(Principal::user("user1"));

        let err = StateExporter::new().export_dir(&state, dir.path()).unwrap_err();
        assert!(err.to_string().contains("not empty"));

        let exporter = StateExporter::with_options(ExportOptions { overwrite: true });
        assert_eq!(exporter.export_dir(&state, dir.path()).unwrap(), 1);
    }

    #[test]
    fn test_catalog_document_shape() {
        let dir = TempDir::new().unwrap();
        let mut state = State::new();
        state.catalogs.push(
            CatalogResource::new(
                "main",
                CatalogSpec {
                    metastore_type: "sqlite".to_string(),
                    dsn: "/data/meta.sqlite".to_string(),
                    data_path: "s3://lake/".to_string(),
                    ..Default::default()
                },
            )
            .protected(),
        );

        StateExporter::new().export_dir(&state, dir.path()).unwrap();

        let content = fs::read_to_string(dir.path().join("catalogs/main/catalog.yaml")).unwrap();
        let doc = yaml(&content);
        assert_eq!(doc["apiVersion"], Value::from("duck/v1"));
        assert_eq!(doc["kind"], Value::from("Catalog"));
        assert_eq!(doc["metadata"]["name"], Value::from("main"));
        assert_eq!(doc["metadata"]["deletion_protection"], Value::from(true));
        assert_eq!(doc["spec"]["metastore_type"], Value::from("sqlite"));
        assert!(doc["spec"].get("comment").is_none());
    }
}
