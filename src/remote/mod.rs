mod apply;
mod collaborators;

pub use apply::{apply_plan, ApplyFailure, ApplyReport};
pub use collaborators::{ActionExecutor, DirectoryStateReader, StateReader};
