use tracing::{debug, error, info};
use crate::diff::{Action, Plan};
use crate::error::{LakePlanError, Result};
use super::collaborators::ActionExecutor;

#[derive(Debug, Clone)]
pub struct ApplyFailure {
    pub action: Action,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub applied: usize,
    pub failure: Option<ApplyFailure>,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Executes the plan's actions strictly in order, one at a time, and stops at
/// the first failure. Plans carrying errors are refused outright. No retries.
pub async fn apply_plan<E>(plan: &Plan, executor: &E) -> Result<ApplyReport>
where
    E: ActionExecutor + ?Sized,
{
    if plan.has_errors() {
        return Err(LakePlanError::PlanHasErrors(plan.errors.len()));
    }

    let mut report = ApplyReport::default();
    for action in &plan.actions {
        debug!("{} {} {}", action.operation.symbol(), action.kind, action.name);
        if let Err(e) = executor.execute(action).await {
            error!("Failed to {} {} {:?}: {}", action.operation, action.kind, action.name, e);
            report.failure = Some(ApplyFailure {
                action: action.clone(),
                error: e.to_string(),
            });
            return Ok(report);
        }
        report.applied += 1;
    }

    info!("Applied {} action(s)", report.applied);
    Ok(report)
}
