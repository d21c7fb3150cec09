use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookSpec {
    pub description: String,
    pub owner: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cell {
    #[serde(rename = "type")]
    pub cell_type: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSpec {
    pub description: String,
    pub schedule_cron: String,
    pub is_paused: bool,
    pub concurrency_limit: Option<i64>,
    pub jobs: Vec<PipelineJob>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineJob {
    pub name: String,
    pub notebook: String,
    pub compute_endpoint: String,
    pub depends_on: Vec<String>,
    pub timeout_seconds: Option<i64>,
    pub retry_count: Option<i64>,
    pub order: Option<i64>,
}

impl PipelineJob {
    pub fn new(name: impl Into<String>, notebook: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notebook: notebook.into(),
            ..Default::default()
        }
    }

    pub fn after(mut self, job: impl Into<String>) -> Self {
        self.depends_on.push(job.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    pub materialization: String,
    pub description: String,
    pub tags: Vec<String>,
    pub sql: String,
    pub config: Option<ModelConfig>,
    pub contract: Option<Contract>,
    pub tests: Vec<ModelTest>,
    pub freshness: Option<Freshness>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub unique_key: Vec<String>,
    pub incremental_strategy: String,
    pub on_schema_change: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contract {
    pub enforce: bool,
    pub columns: Vec<ContractColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelTest {
    pub name: String,
    #[serde(rename = "type")]
    pub test_type: String,
    pub column: String,
    pub values: Vec<String>,
    pub to_model: String,
    pub to_column: String,
    pub sql: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Freshness {
    pub max_lag_seconds: i64,
    pub cron_schedule: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroSpec {
    pub macro_type: String,
    pub parameters: Vec<String>,
    pub body: String,
    pub description: String,
    pub catalog_name: String,
    pub project_name: String,
    pub visibility: String,
    pub owner: String,
    pub properties: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotebookResource {
    pub name: String,
    pub deletion_protection: bool,
    pub spec: NotebookSpec,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineResource {
    pub name: String,
    pub deletion_protection: bool,
    pub spec: PipelineSpec,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResource {
    pub project: String,
    pub name: String,
    pub deletion_protection: bool,
    pub spec: ModelSpec,
}

impl ModelResource {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.project, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroResource {
    pub name: String,
    pub deletion_protection: bool,
    pub spec: MacroSpec,
}
