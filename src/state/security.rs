use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Principal {
    pub name: String,
    #[serde(rename = "type")]
    pub principal_type: String,
    pub is_admin: bool,
}

impl Principal {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            principal_type: "user".to_string(),
            is_admin: false,
        }
    }

    pub fn service(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            principal_type: "service_principal".to_string(),
            is_admin: false,
        }
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub name: String,
    pub description: String,
    pub members: Vec<Member>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_member(mut self, name: impl Into<String>, member_type: impl Into<String>) -> Self {
        self.members.push(Member {
            name: name.into(),
            member_type: member_type.into(),
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub member_type: String,
}

/// A single privilege on a securable. All five fields together form its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Grant {
    pub principal: String,
    pub principal_type: String,
    pub securable_type: String,
    pub securable: String,
    pub privilege: String,
}

impl Grant {
    pub fn new(
        principal: impl Into<String>,
        principal_type: impl Into<String>,
        securable_type: impl Into<String>,
        securable: impl Into<String>,
        privilege: impl Into<String>,
    ) -> Self {
        Self {
            principal: principal.into(),
            principal_type: principal_type.into(),
            securable_type: securable_type.into(),
            securable: securable.into(),
            privilege: privilege.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivilegePreset {
    pub name: String,
    pub privileges: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Binding {
    pub principal: String,
    pub principal_type: String,
    pub preset: String,
    pub scope_type: String,
    pub scope: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKey {
    pub name: String,
    pub principal: String,
    pub expires_at: Option<String>,
}
