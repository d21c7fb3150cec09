mod kind;
mod document;

pub use kind::{ResourceKind, Operation, MAX_LAYER};
pub use document::{DocKind, API_VERSION};
