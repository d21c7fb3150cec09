mod differ;
mod fields;
mod plan;

pub use differ::{diff, Differ};
pub use fields::render_map;
pub use plan::{Action, FieldDiff, Plan, PlanError, PlanSummary};
