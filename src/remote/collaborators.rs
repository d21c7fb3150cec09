use std::path::PathBuf;
use async_trait::async_trait;
use crate::diff::Action;
use crate::error::Result;
use crate::loader::{LoadOptions, StateLoader};
use crate::state::State;

/// Source of the actual state, e.g. a client for the live server.
#[async_trait]
pub trait StateReader: Send + Sync {
    async fn read_state(&self) -> Result<State>;
}

/// Performs the remote mutation for a single action.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &Action) -> Result<()>;
}

/// Reads actual state from an exported config tree, for offline planning.
#[derive(Debug, Clone)]
pub struct DirectoryStateReader {
    root: PathBuf,
    options: LoadOptions,
}

impl DirectoryStateReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: LoadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl StateReader for DirectoryStateReader {
    async fn read_state(&self) -> Result<State> {
        StateLoader::with_options(self.options).load_dir(&self.root)
    }
}
