pub mod error;
pub mod model;
pub mod state;
pub mod loader;
pub mod exporter;
pub mod validate;
pub mod security;
pub mod diff;
pub mod format;
pub mod remote;

pub use error::{LakePlanError, Result};
pub use model::{ResourceKind, Operation, DocKind, API_VERSION, MAX_LAYER};
pub use state::State;
pub use loader::{StateLoader, LoadOptions};
pub use exporter::{StateExporter, ExportOptions};
pub use validate::{StateValidator, ValidationError, ValidationResult, find_cycles};
pub use security::{effective_grants, compile_grants, CompiledGrant, GrantOrigin};
pub use diff::{diff, Differ, Plan, Action, FieldDiff, PlanError, PlanSummary, render_map};
pub use format::{render_text, render_json, render_grants_table, render_grants_json, format_line_diff, TextOptions, GrantRow};
pub use remote::{StateReader, ActionExecutor, DirectoryStateReader, apply_plan, ApplyReport, ApplyFailure};
