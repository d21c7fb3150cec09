use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageCredential {
    pub name: String,
    pub credential_type: String,
    pub comment: String,
    pub s3: Option<S3Credential>,
    pub azure: Option<AzureCredential>,
    pub gcs: Option<GcsCredential>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Credential {
    pub key_id_from_env: String,
    pub secret_from_env: String,
    pub endpoint: String,
    pub region: String,
    pub url_style: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureCredential {
    pub account_name_from_env: String,
    pub account_key_from_env: String,
    pub client_id_from_env: String,
    pub client_secret_from_env: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcsCredential {
    pub key_file_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalLocation {
    pub name: String,
    pub url: String,
    pub credential_name: String,
    pub storage_type: String,
    pub comment: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeEndpoint {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub endpoint_type: String,
    pub size: String,
    pub max_memory_gb: Option<i64>,
    pub auth_token_from_env: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeAssignment {
    pub endpoint: String,
    pub principal: String,
    pub principal_type: String,
    pub is_default: bool,
    pub fallback_local: bool,
}

impl ComputeAssignment {
    pub fn identity(&self) -> String {
        format!("{}->{}:{}", self.endpoint, self.principal_type, self.principal)
    }
}
