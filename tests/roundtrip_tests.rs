use lakeplan::state::{CatalogResource, CatalogSpec, Principal, SchemaResource, SchemaSpec, State};
use lakeplan::{diff, ExportOptions, LakePlanError, StateExporter, StateLoader, StateValidator};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn fixtures_path() -> &'static Path {
    Path::new("tests/fixtures/config")
}

#[test]
fn test_export_then_load_is_diff_equal() {
    let original = StateLoader::new().load_dir(fixtures_path()).unwrap();
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("export");

    let written = StateExporter::new().export_dir(&original, &target).unwrap();
    let reloaded = StateLoader::new().load_dir(&target).unwrap();

    assert_eq!(reloaded.resource_count(), original.resource_count());
    assert!(!diff(&original, &reloaded).has_changes());
    assert!(!diff(&reloaded, &original).has_changes());
    assert!(StateValidator::new().validate(&reloaded).is_valid());

    // 11 list documents (tags and assignments share one) plus one file per
    // catalog, schema, table, view, volume, filter set, mask set, notebook,
    // pipeline, model and macro.
    assert_eq!(written, 11 + 12);
}

#[test]
fn test_empty_property_value_survives_export() {
    let mut state = State::new();
    state.catalogs.push(CatalogResource::new(
        "main",
        CatalogSpec {
            metastore_type: "sqlite".to_string(),
            dsn: "/data/meta.sqlite".to_string(),
            data_path: "s3://lake/".to_string(),
            ..Default::default()
        },
    ));
    let mut spec = SchemaSpec::default();
    spec.properties.insert("owner_team".to_string(), String::new());
    spec.properties.insert("env".to_string(), "prod".to_string());
    state.schemas.push(SchemaResource::new("main", "sales", spec));
    assert!(StateValidator::new().validate(&state).is_valid());

    let dir = TempDir::new().unwrap();
    StateExporter::new().export_dir(&state, dir.path()).unwrap();
    let reloaded = StateLoader::new().load_dir(dir.path()).unwrap();

    assert_eq!(reloaded.schemas[0].spec.properties.get("owner_team").map(String::as_str), Some(""));
    assert!(!diff(&reloaded, &state).has_changes());
    assert!(!diff(&state, &reloaded).has_changes());
}

#[test]
fn test_export_uses_canonical_layout() {
    let original = StateLoader::new().load_dir(fixtures_path()).unwrap();
    let dir = TempDir::new().unwrap();
    StateExporter::new().export_dir(&original, dir.path()).unwrap();

    for rel in [
        "security/principals.yaml",
        "security/privilege-presets.yaml",
        "governance/tags.yaml",
        "catalogs/main/catalog.yaml",
        "catalogs/main/schemas/sales/tables/orders/column-masks.yaml",
        "catalogs/main/schemas/sales/views/big_orders.yaml",
        "models/analytics/stg_orders.yaml",
        "macros/cents_to_dollars.yaml",
    ] {
        assert!(dir.path().join(rel).is_file(), "missing {}", rel);
    }
    assert!(!dir.path().join("catalogs/main/schemas/sales/views/README.txt").exists());
}

#[test]
fn test_export_refuses_non_empty_target() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

    let mut state = State::new();
    state.principals.push(Principal::user("alice"));

    let err = StateExporter::new().export_dir(&state, dir.path()).unwrap_err();
    assert!(matches!(err, LakePlanError::ExportTargetNotEmpty(_)));
    assert!(!dir.path().join("security").exists());
}

#[test]
fn test_export_overwrite_replaces_documents() {
    let dir = TempDir::new().unwrap();
    let exporter = StateExporter::with_options(ExportOptions { overwrite: true });

    let mut state = State::new();
    state.principals.push(Principal::user("alice"));
    exporter.export_dir(&state, dir.path()).unwrap();

    state.principals.push(Principal::service("etl-bot"));
    exporter.export_dir(&state, dir.path()).unwrap();

    let reloaded = StateLoader::new().load_dir(dir.path()).unwrap();
    assert_eq!(reloaded.principals.len(), 2);
    assert_eq!(reloaded.principals[1].principal_type, "service_principal");
}

#[test]
fn test_export_empty_state_writes_no_files() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out");
    let written = StateExporter::new().export_dir(&State::new(), &target).unwrap();
    assert_eq!(written, 0);
    assert!(target.is_dir());
    assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
}
