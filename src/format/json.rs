use serde::Serialize;
use crate::diff::{Action, Plan, PlanError, PlanSummary};
use crate::error::Result;

#[derive(Serialize)]
struct JsonPlan<'a> {
    actions: &'a [Action],
    errors: &'a [PlanError],
    summary: PlanSummary,
}

/// Machine-readable plan: `{actions, errors, summary}`, pretty-printed.
pub fn render_json(plan: &Plan) -> Result<String> {
    let doc = JsonPlan {
        actions: &plan.actions,
        errors: &plan.errors,
        summary: plan.summary(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
