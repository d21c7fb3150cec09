use lakeplan::state::{
    ApiKey, Binding, ColumnMaskSet, ColumnMaskSpec, Grant, Group, ModelResource, ModelSpec,
    ModelTest, PipelineJob, PipelineResource, PipelineSpec, Principal, PrivilegePreset, State,
    TableResource, TableSpec,
};
use lakeplan::{StateLoader, StateValidator};
use std::path::Path;

fn fixtures_path() -> &'static Path {
    Path::new("tests/fixtures/config")
}

fn fixture_state() -> State {
    StateLoader::new().load_dir(fixtures_path()).unwrap()
}

#[test]
fn test_fixture_is_valid() {
    let result = StateValidator::new().validate(&fixture_state());
    assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
}

#[test]
fn test_three_group_cycle() {
    let mut state = State::new();
    state.groups.push(Group::new("a").with_member("b", "group"));
    state.groups.push(Group::new("b").with_member("c", "group"));
    state.groups.push(Group::new("c").with_member("a", "group"));

    let result = StateValidator::new().validate(&state);
    assert_eq!(result.len(), 1);
    assert!(result.contains("groups: circular membership detected: a -> b -> c -> a"));
}

#[test]
fn test_job_dependency_cycle() {
    let mut state = fixture_state();
    let jobs = &mut state.pipelines[0].spec.jobs;
    jobs[0].depends_on.push("report".to_string());

    let result = StateValidator::new().validate(&state);
    assert_eq!(result.len(), 1);
    assert!(result.contains("pipeline[nightly]: circular job dependency detected"));
}

#[test]
fn test_dangling_references() {
    let mut state = State::new();
    state.principals.push(Principal::user("alice"));
    state.groups.push(Group::new("team").with_member("ghost", "user"));
    state.api_keys.push(ApiKey {
        name: "k".into(),
        principal: "nobody".into(),
        expires_at: None,
    });
    state.pipelines.push(PipelineResource {
        name: "etl".into(),
        deletion_protection: false,
        spec: PipelineSpec {
            jobs: vec![PipelineJob::new("load", "missing_nb").after("extract")],
            ..Default::default()
        },
    });

    let result = StateValidator::new().validate(&state);
    assert!(result.contains("group[team].members[0]: member \"ghost\" references unknown principal"));
    assert!(result.contains("api_key[k]: references unknown principal \"nobody\""));
    assert!(result.contains("references unknown notebook \"missing_nb\""));
    assert!(result.contains("depends_on references unknown job \"extract\" in pipeline \"etl\""));
    assert_eq!(result.len(), 4);
}

#[test]
fn test_grant_securable_arity_and_existence() {
    let mut state = fixture_state();
    state.grants.push(Grant::new("alice", "user", "table", "main.orders", "SELECT"));
    state.grants.push(Grant::new("alice", "user", "table", "main.sales.missing", "SELECT"));
    state.grants.push(Grant::new("alice", "user", "catalog", "main", "FLY"));

    let result = StateValidator::new().validate(&state);
    assert!(result.contains("table securable must be \"catalog.schema.table\", got \"main.orders\""));
    assert!(result.contains("securable references unknown table \"main.sales.missing\""));
    assert!(result.contains("unknown privilege \"FLY\""));
    assert_eq!(result.len(), 3);
}

#[test]
fn test_duplicate_grant() {
    let mut state = fixture_state();
    let first = state.grants[0].clone();
    state.grants.push(first);

    let result = StateValidator::new().validate(&state);
    assert_eq!(result.len(), 1);
    assert!(result.contains("grant[2]: duplicate grant"));
}

#[test]
fn test_binding_checked_like_grant() {
    let mut state = fixture_state();
    state.bindings.push(Binding {
        principal: "analysts".into(),
        principal_type: "group".into(),
        preset: "writer".into(),
        scope_type: "schema".into(),
        scope: "main".into(),
    });
    state.privilege_presets.push(PrivilegePreset {
        name: "empty".into(),
        privileges: vec![],
    });

    let result = StateValidator::new().validate(&state);
    assert!(result.contains("binding[1]: references unknown preset \"writer\""));
    assert!(result.contains("schema securable must be \"catalog.schema\", got \"main\""));
    assert!(result.contains("preset[empty]: privileges must not be empty"));
}

#[test]
fn test_external_table_requirements() {
    let mut state = fixture_state();
    state.tables.push(TableResource::new(
        "main",
        "sales",
        "raw_events",
        TableSpec {
            table_type: "EXTERNAL".into(),
            ..Default::default()
        },
    ));

    let result = StateValidator::new().validate(&state);
    assert!(result.contains("table[main.sales.raw_events]: source_path is required for EXTERNAL tables"));
    assert!(result.contains("file_format is required for EXTERNAL tables"));
    assert_eq!(result.len(), 2);
}

#[test]
fn test_mask_column_checked_only_when_columns_declared() {
    let mut state = fixture_state();
    state.column_masks[0].masks[0].column_name = "phone".into();

    let result = StateValidator::new().validate(&state);
    assert!(result.contains("column \"phone\" not found in table \"main.sales.orders\""));

    let mut state = fixture_state();
    state.tables.push(TableResource::new("main", "sales", "events", TableSpec::default()));
    state.column_masks.push(ColumnMaskSet {
        catalog: "main".into(),
        schema: "sales".into(),
        table: "events".into(),
        masks: vec![ColumnMaskSpec {
            name: "m".into(),
            column_name: "anything".into(),
            mask_expression: "NULL".into(),
            ..Default::default()
        }],
    });
    let result = StateValidator::new().validate(&state);
    assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
}

#[test]
fn test_duplicate_names() {
    let mut state = fixture_state();
    state.principals.push(Principal::user("bob"));
    state.groups.push(Group::new("admins"));

    let result = StateValidator::new().validate(&state);
    assert!(result.contains("duplicate principal name \"bob\""));
    assert!(result.contains("duplicate group name \"admins\""));
    assert_eq!(result.len(), 2);
}

#[test]
fn test_model_test_rules() {
    let mut state = State::new();
    state.models.push(ModelResource {
        project: "analytics".into(),
        name: "m".into(),
        deletion_protection: false,
        spec: ModelSpec {
            sql: "SELECT 1".into(),
            materialization: "INCREMENTAL".into(),
            tests: vec![
                ModelTest {
                    name: "vals".into(),
                    test_type: "accepted_values".into(),
                    column: "status".into(),
                    ..Default::default()
                },
                ModelTest {
                    name: "rel".into(),
                    test_type: "relationships".into(),
                    column: "id".into(),
                    to_model: "other".into(),
                    ..Default::default()
                },
                ModelTest {
                    name: "x".into(),
                    test_type: "freshness".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        },
    });

    let result = StateValidator::new().validate(&state);
    assert!(result.contains("config.unique_key is required for INCREMENTAL models"));
    assert!(result.contains("values are required for accepted_values tests"));
    assert!(result.contains("to_model and to_column are required for relationships tests"));
    assert!(result.contains("test type must be one of"));
    assert_eq!(result.len(), 4);
}

#[test]
fn test_api_key_expiry_must_be_rfc3339() {
    let mut state = fixture_state();
    state.api_keys[0].expires_at = Some("next tuesday".into());

    let result = StateValidator::new().validate(&state);
    assert_eq!(result.len(), 1);
    assert!(result.contains("expires_at must be an RFC3339 timestamp, got \"next tuesday\""));
}

#[test]
fn test_all_errors_collected() {
    let mut state = fixture_state();
    state.catalogs[0].spec.metastore_type = "mysql".into();
    state.principals[0].principal_type = "robot".into();
    state.compute_endpoints[1].url.clear();

    let result = StateValidator::new().validate(&state);
    assert_eq!(result.len(), 3);
}
