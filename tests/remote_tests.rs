use async_trait::async_trait;
use lakeplan::state::State;
use lakeplan::{
    apply_plan, diff, Action, ActionExecutor, DirectoryStateReader, LakePlanError, Result,
    StateLoader, StateReader,
};
use std::path::Path;
use std::sync::Mutex;

fn fixtures_path() -> &'static Path {
    Path::new("tests/fixtures/config")
}

/// Records every action it is handed; fails on the one named `fail_on`.
#[derive(Default)]
struct RecordingExecutor {
    seen: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingExecutor {
    fn failing_on(name: &str) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            fail_on: Some(name.to_string()),
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, action: &Action) -> Result<()> {
        self.seen.lock().unwrap().push(action.name.clone());
        if self.fail_on.as_deref() == Some(action.name.as_str()) {
            return Err(LakePlanError::Execution(format!("server rejected {}", action.name)));
        }
        Ok(())
    }
}

#[test]
fn test_apply_runs_actions_in_plan_order() {
    let plan = diff(&StateLoader::new().load_dir(fixtures_path()).unwrap(), &State::new());
    let executor = RecordingExecutor::default();

    let report = tokio_test::block_on(apply_plan(&plan, &executor)).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.applied, plan.actions.len());
    let expected: Vec<String> = plan.actions.iter().map(|a| a.name.clone()).collect();
    assert_eq!(executor.seen(), expected);
}

#[test]
fn test_apply_stops_at_first_failure() {
    let plan = diff(&StateLoader::new().load_dir(fixtures_path()).unwrap(), &State::new());
    let executor = RecordingExecutor::failing_on("analysts");

    let report = tokio_test::block_on(apply_plan(&plan, &executor)).unwrap();

    let position = plan.actions.iter().position(|a| a.name == "analysts").unwrap();
    assert!(!report.is_complete());
    assert_eq!(report.applied, position);
    assert_eq!(executor.seen().len(), position + 1);

    let failure = report.failure.unwrap();
    assert_eq!(failure.action.name, "analysts");
    assert!(failure.error.contains("server rejected analysts"));
}

#[test]
fn test_apply_refuses_plan_with_errors() {
    let plan = diff(&State::new(), &StateLoader::new().load_dir(fixtures_path()).unwrap());
    assert!(plan.has_errors());
    let executor = RecordingExecutor::default();

    let err = tokio_test::block_on(apply_plan(&plan, &executor)).unwrap_err();

    assert!(matches!(err, LakePlanError::PlanHasErrors(1)));
    assert!(executor.seen().is_empty());
}

#[test]
fn test_directory_reader_loads_actual_state() {
    let reader = DirectoryStateReader::new(fixtures_path());
    let actual = tokio_test::block_on(reader.read_state()).unwrap();
    assert_eq!(actual.resource_count(), 31);

    let desired = StateLoader::new().load_dir(fixtures_path()).unwrap();
    assert!(!diff(&desired, &actual).has_changes());
}

#[test]
fn test_directory_reader_propagates_load_errors() {
    let reader = DirectoryStateReader::new("tests/fixtures/does-not-exist");
    let err = tokio_test::block_on(reader.read_state()).unwrap_err();
    assert!(matches!(err, LakePlanError::NotFound(_)));
}
