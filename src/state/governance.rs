use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub key: String,
    pub value: Option<String>,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            key: key.into(),
            value: value.map(str::to_string),
        }
    }

    /// `key` or `key:value`. An empty value is the same tag as no value.
    pub fn identity(&self) -> String {
        match self.value.as_deref() {
            Some(v) if !v.is_empty() => format!("{}:{}", self.key, v),
            _ => self.key.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagAssignment {
    pub tag: String,
    pub securable_type: String,
    pub securable: String,
    pub column_name: String,
}

impl TagAssignment {
    pub fn identity(&self) -> String {
        if self.column_name.is_empty() {
            format!("{} on {}.{}", self.tag, self.securable_type, self.securable)
        } else {
            format!(
                "{} on {}.{}.{}",
                self.tag, self.securable_type, self.securable, self.column_name
            )
        }
    }
}
