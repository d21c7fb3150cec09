use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LakePlanError {
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{}: unsupported apiVersion {found:?} (expected {expected:?})", path.display())]
    UnsupportedApiVersion {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },

    #[error("{}: unexpected kind {found:?} (expected {expected:?})", path.display())]
    UnexpectedKind {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },

    #[error("{}: metadata.name {name:?} does not match {location} name {expected:?}", path.display())]
    NameMismatch {
        path: PathBuf,
        name: String,
        expected: String,
        location: &'static str,
    },

    #[error("{}: unknown field(s): {}", path.display(), fields.join(", "))]
    UnknownFields { path: PathBuf, fields: Vec<String> },

    #[error("config directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("config path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("export target {} is not empty (use overwrite to replace)", .0.display())]
    ExportTargetNotEmpty(PathBuf),

    #[error("plan has {0} unresolved error(s); refusing to apply")]
    PlanHasErrors(usize),

    #[error("Executor error: {0}")]
    Execution(String),

    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LakePlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_message() {
        let err = LakePlanError::UnsupportedApiVersion {
            path: PathBuf::from("security/principals.yaml"),
            found: "duck/v2".to_string(),
            expected: "duck/v1",
        };
        assert_eq!(
            err.to_string(),
            "security/principals.yaml: unsupported apiVersion \"duck/v2\" (expected \"duck/v1\")"
        );
    }

    #[test]
    fn test_name_mismatch_message() {
        let err = LakePlanError::NameMismatch {
            path: PathBuf::from("catalogs/main/catalog.yaml"),
            name: "other".to_string(),
            expected: "main".to_string(),
            location: "directory",
        };
        assert!(err.to_string().contains("does not match directory name \"main\""));
    }

    #[test]
    fn test_unknown_fields_message() {
        let err = LakePlanError::UnknownFields {
            path: PathBuf::from("x.yaml"),
            fields: vec!["spec.foo".to_string(), "bar".to_string()],
        };
        assert_eq!(err.to_string(), "x.yaml: unknown field(s): spec.foo, bar");
    }
}
