use lakeplan::state::State;
use lakeplan::{
    diff, effective_grants, render_grants_json, render_grants_table, render_json, render_text,
    StateLoader, TextOptions,
};
use serde_json::Value;
use std::path::Path;

fn fixtures_path() -> &'static Path {
    Path::new("tests/fixtures/config")
}

fn fixture_state() -> State {
    StateLoader::new().load_dir(fixtures_path()).unwrap()
}

#[test]
fn test_text_plan_for_fresh_install() {
    let plan = diff(&fixture_state(), &State::new());
    let text = render_text(&plan, &TextOptions::plain());

    assert!(text.contains("\n# security/principals.yaml\n"));
    assert!(text.contains("  + principal \"alice\" will be created\n"));
    assert!(text.contains("  + group-membership \"admins/analysts(group)\" will be created\n"));
    assert!(text.contains("# catalogs/main/schemas/sales/tables/orders/row-filters.yaml"));
    assert!(text.contains("  + pipeline-job \"nightly/report\" will be created\n"));
    assert!(text.ends_with("\nPlan: 38 to create, 0 to update, 0 to delete.\n"));
    assert!(!text.contains("error(s)"));
}

#[test]
fn test_text_plan_groups_deletes_as_server_only() {
    let plan = diff(&State::new(), &fixture_state());
    let text = render_text(&plan, &TextOptions::plain());

    assert_eq!(text.matches("# (server-only)").count(), 1);
    assert!(text.contains("  - macro \"cents_to_dollars\" will be deleted\n"));
    assert!(text.contains(
        "  ✗ catalog-registration \"main\": cannot delete catalog: deletion_protection is enabled\n"
    ));
    assert!(text.ends_with("Plan: 0 to create, 0 to update, 37 to delete. 1 error(s).\n"));
}

#[test]
fn test_text_plan_shows_multiline_diff() {
    let actual = fixture_state();
    let mut desired = actual.clone();
    desired.views[0].spec.view_definition = desired.views[0]
        .spec
        .view_definition
        .replace("total > 1000", "total > 5000");

    let plan = diff(&desired, &actual);
    let text = render_text(&plan, &TextOptions::plain());

    assert!(text.contains("  ~ view \"main.sales.big_orders\" will be updated\n"));
    assert!(text.contains("      view_definition:\n"));
    assert!(text.contains("        - WHERE total > 1000\n"));
    assert!(text.contains("        + WHERE total > 5000\n"));
    assert!(text.contains("          SELECT id, total\n"));
}

#[test]
fn test_no_changes_message() {
    let state = fixture_state();
    let text = render_text(&diff(&state, &state), &TextOptions::plain());
    assert_eq!(text, "No changes. Infrastructure is up-to-date.\n");
}

#[test]
fn test_plain_text_has_no_ansi_codes() {
    let plan = diff(&State::new(), &fixture_state());
    let text = render_text(&plan, &TextOptions::plain());
    assert!(!text.contains('\u{1b}'));
}

#[test]
fn test_json_plan() {
    let plan = diff(&State::new(), &fixture_state());
    let json: Value = serde_json::from_str(&render_json(&plan).unwrap()).unwrap();

    assert_eq!(json["summary"]["creates"], 0);
    assert_eq!(json["summary"]["deletes"], 37);
    assert_eq!(json["summary"]["errors"], 1);
    assert_eq!(json["actions"].as_array().unwrap().len(), 37);

    let first = &json["actions"][0];
    assert_eq!(first["operation"], "delete");
    assert_eq!(first["resource_type"], "pipeline-job");
    assert_eq!(first["resource_name"], "nightly/extract");
    assert!(first.get("path").is_none());

    assert_eq!(json["errors"][0]["resource_type"], "catalog-registration");
    assert_eq!(json["errors"][0]["resource_name"], "main");
}

#[test]
fn test_json_plan_always_has_errors_array() {
    let state = fixture_state();
    let json: Value = serde_json::from_str(&render_json(&diff(&state, &state)).unwrap()).unwrap();
    assert_eq!(json["errors"], Value::Array(vec![]));
    assert_eq!(json["actions"], Value::Array(vec![]));
}

#[test]
fn test_effective_grants_table() {
    let grants = effective_grants(&fixture_state());
    assert_eq!(grants.len(), 3);

    let table = render_grants_table(&grants);
    assert!(table.contains("Principal"));
    assert!(table.contains("schema main.sales"));
    assert!(table.contains("USE_CATALOG"));

    let json: Value = serde_json::from_str(&render_grants_json(&grants).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert_eq!(json[2]["privilege"], "SELECT");
}
