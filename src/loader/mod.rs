pub(crate) mod documents;
mod loader;
mod strict;
pub mod paths;

pub use loader::{LoadOptions, StateLoader};
