use std::collections::{HashMap, HashSet};
use std::fmt;
use chrono::DateTime;
use regex::Regex;
use crate::state::{
    ColumnMaskSet, ModelResource, PipelineResource, RowFilterSet, State, Tag,
};
use super::cycles::find_cycles;

const PRINCIPAL_TYPES: &[&str] = &["user", "service_principal"];
const MEMBER_TYPES: &[&str] = &["user", "group"];
const GRANTEE_TYPES: &[&str] = &["user", "group"];
const SECURABLE_TYPES: &[&str] = &[
    "catalog",
    "schema",
    "table",
    "external_location",
    "storage_credential",
    "volume",
];
const PRIVILEGES: &[&str] = &[
    "SELECT",
    "INSERT",
    "UPDATE",
    "DELETE",
    "USAGE",
    "USE_CATALOG",
    "USE_SCHEMA",
    "CREATE_TABLE",
    "CREATE_SCHEMA",
    "ALL_PRIVILEGES",
    "CREATE_EXTERNAL_LOCATION",
    "CREATE_STORAGE_CREDENTIAL",
    "CREATE_VOLUME",
    "READ_VOLUME",
    "WRITE_VOLUME",
    "READ_FILES",
    "WRITE_FILES",
    "MANAGE_COMPUTE",
    "MANAGE_PIPELINES",
];
const METASTORE_TYPES: &[&str] = &["sqlite", "postgres"];
const STORAGE_KINDS: &[&str] = &["MANAGED", "EXTERNAL"];
const CREDENTIAL_TYPES: &[&str] = &["S3", "AZURE", "GCS"];
const COMPUTE_TYPES: &[&str] = &["LOCAL", "REMOTE"];
const CELL_TYPES: &[&str] = &["sql", "markdown"];
const TAG_SECURABLE_TYPES: &[&str] = &["schema", "table", "column"];
const MATERIALIZATIONS: &[&str] = &["VIEW", "TABLE", "INCREMENTAL", "EPHEMERAL"];
const TEST_TYPES: &[&str] = &["not_null", "unique", "accepted_values", "relationships", "custom_sql"];
const MACRO_TYPES: &[&str] = &["", "SCALAR", "TABLE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.to_string().contains(needle))
    }

    fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Locator for list entries: the name when there is one, else the index.
fn locator(kind: &str, name: &str, index: usize) -> String {
    if name.is_empty() {
        format!("{}[{}]", kind, index)
    } else {
        format!("{}[{}]", kind, name)
    }
}

fn one_of(allowed: &[&str]) -> String {
    format!("[{}]", allowed.join(", "))
}

/// Names every reference can resolve against, built once per pass.
struct Lookups<'a> {
    principals: HashSet<&'a str>,
    groups: HashSet<&'a str>,
    catalogs: HashSet<&'a str>,
    schemas: HashSet<String>,
    tables: HashSet<String>,
    table_columns: HashMap<String, HashSet<&'a str>>,
    volumes: HashSet<String>,
    credentials: HashSet<&'a str>,
    locations: HashSet<&'a str>,
    endpoints: HashSet<&'a str>,
    notebooks: HashSet<&'a str>,
    tags: HashSet<String>,
    presets: HashSet<&'a str>,
}

impl<'a> Lookups<'a> {
    fn build(state: &'a State) -> Self {
        let mut table_columns = HashMap::new();
        for t in &state.tables {
            // Tables without declared columns are left out: their columns are unknown.
            if !t.spec.columns.is_empty() {
                table_columns.insert(
                    t.full_name(),
                    t.spec.columns.iter().map(|c| c.name.as_str()).collect(),
                );
            }
        }

        Self {
            principals: state.principals.iter().map(|p| p.name.as_str()).collect(),
            groups: state.groups.iter().map(|g| g.name.as_str()).collect(),
            catalogs: state.catalogs.iter().map(|c| c.name.as_str()).collect(),
            schemas: state.schemas.iter().map(|s| s.full_name()).collect(),
            tables: state.tables.iter().map(|t| t.full_name()).collect(),
            table_columns,
            volumes: state.volumes.iter().map(|v| v.full_name()).collect(),
            credentials: state.storage_credentials.iter().map(|c| c.name.as_str()).collect(),
            locations: state.external_locations.iter().map(|l| l.name.as_str()).collect(),
            endpoints: state.compute_endpoints.iter().map(|e| e.name.as_str()).collect(),
            notebooks: state.notebooks.iter().map(|n| n.name.as_str()).collect(),
            tags: state.tags.iter().map(Tag::identity).collect(),
            presets: state.privilege_presets.iter().map(|p| p.name.as_str()).collect(),
        }
    }

    fn principal_exists(&self, name: &str, principal_type: &str) -> bool {
        match principal_type {
            "user" | "service_principal" => self.principals.contains(name),
            "group" => self.groups.contains(name),
            _ => false,
        }
    }

    /// `Some(message)` when `table` declares columns and `column` is not one of them.
    fn missing_column(&self, table: &str, column: &str) -> Option<String> {
        let columns = self.table_columns.get(table)?;
        if columns.contains(column) {
            None
        } else {
            Some(format!("column {:?} not found in table {:?}", column, table))
        }
    }

    /// Checks path arity for the securable type, then that the target exists.
    fn securable_problem(&self, securable_type: &str, securable: &str) -> Option<String> {
        let segments = securable.split('.').count();
        let (arity, shape, known, label) = match securable_type {
            "catalog" => (1, "a single name", self.catalogs.contains(securable), "catalog"),
            "schema" => (2, "\"catalog.schema\"", self.schemas.contains(securable), "schema"),
            "table" => (3, "\"catalog.schema.table\"", self.tables.contains(securable), "table"),
            "volume" => (3, "\"catalog.schema.volume\"", self.volumes.contains(securable), "volume"),
            "external_location" => (1, "a single name", self.locations.contains(securable), "external location"),
            "storage_credential" => (1, "a single name", self.credentials.contains(securable), "storage credential"),
            _ => return None,
        };
        if segments != arity {
            return Some(format!(
                "{} securable must be {}, got {:?}",
                securable_type, shape, securable
            ));
        }
        if !known {
            return Some(format!("securable references unknown {} {:?}", label, securable));
        }
        None
    }
}

pub struct StateValidator {
    cron_pattern: Regex,
}

impl Default for StateValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl StateValidator {
    pub fn new() -> Self {
        Self {
            cron_pattern: Regex::new(r"^\S+(\s+\S+){4}$").expect("cron pattern is valid"),
        }
    }

    /// Collects every structural, referential and cycle problem in `state`.
    pub fn validate(&self, state: &State) -> ValidationResult {
        let lookups = Lookups::build(state);
        let mut result = ValidationResult::default();

        Self::check_principals(state, &mut result);
        Self::check_groups(state, &lookups, &mut result);
        Self::check_grants(state, &lookups, &mut result);
        Self::check_presets(state, &mut result);
        Self::check_bindings(state, &lookups, &mut result);
        Self::check_catalogs(state, &mut result);
        Self::check_schemas(state, &lookups, &mut result);
        Self::check_tables(state, &lookups, &mut result);
        Self::check_views(state, &lookups, &mut result);
        Self::check_volumes(state, &lookups, &mut result);
        for set in &state.row_filters {
            Self::check_row_filters(set, &lookups, &mut result);
        }
        for set in &state.column_masks {
            Self::check_column_masks(set, &lookups, &mut result);
        }
        Self::check_tags(state, &mut result);
        Self::check_tag_assignments(state, &lookups, &mut result);
        Self::check_storage_credentials(state, &mut result);
        Self::check_external_locations(state, &lookups, &mut result);
        Self::check_compute(state, &lookups, &mut result);
        Self::check_api_keys(state, &lookups, &mut result);
        Self::check_notebooks(state, &mut result);
        for pipeline in &state.pipelines {
            self.check_pipeline(pipeline, &lookups, &mut result);
        }
        Self::check_pipeline_names(state, &mut result);
        Self::check_models(&state.models, &mut result);
        Self::check_macros(state, &mut result);

        result
    }

    fn check_principals(state: &State, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, p) in state.principals.iter().enumerate() {
            let path = locator("principal", &p.name, i);
            if p.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(p.name.as_str()) {
                result.add(&path, format!("duplicate principal name {:?}", p.name));
            }
            if !PRINCIPAL_TYPES.contains(&p.principal_type.as_str()) {
                result.add(
                    &path,
                    format!("type must be \"user\" or \"service_principal\", got {:?}", p.principal_type),
                );
            }
        }
    }

    fn check_groups(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, g) in state.groups.iter().enumerate() {
            let path = locator("group", &g.name, i);
            if g.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(g.name.as_str()) {
                result.add(&path, format!("duplicate group name {:?}", g.name));
            }

            for (j, m) in g.members.iter().enumerate() {
                let member_path = format!("{}.members[{}]", path, j);
                match m.member_type.as_str() {
                    "user" if !lookups.principals.contains(m.name.as_str()) => {
                        result.add(&member_path, format!("member {:?} references unknown principal", m.name));
                    }
                    "group" if !lookups.groups.contains(m.name.as_str()) => {
                        result.add(&member_path, format!("member {:?} references unknown group", m.name));
                    }
                    t if !MEMBER_TYPES.contains(&t) => {
                        result.add(&member_path, format!("member type must be \"user\" or \"group\", got {:?}", t));
                    }
                    _ => {}
                }
            }
        }

        let cycles = find_cycles(
            &state.groups,
            |g| g.name.as_str(),
            |g| {
                g.members
                    .iter()
                    .filter(|m| m.member_type == "group")
                    .map(|m| m.name.as_str())
                    .collect()
            },
        );
        for cycle in cycles {
            result.add("groups", format!("circular membership detected: {}", cycle.join(" -> ")));
        }
    }

    fn check_grants(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, g) in state.grants.iter().enumerate() {
            let path = format!("grant[{}]", i);
            Self::check_grantee(&g.principal, &g.principal_type, lookups, &path, result);

            if !SECURABLE_TYPES.contains(&g.securable_type.as_str()) {
                result.add(
                    &path,
                    format!("securable_type must be one of {}, got {:?}", one_of(SECURABLE_TYPES), g.securable_type),
                );
            }
            if g.securable.is_empty() {
                result.add(&path, "securable is required");
            } else if let Some(problem) = lookups.securable_problem(&g.securable_type, &g.securable) {
                result.add(&path, problem);
            }
            if !PRIVILEGES.contains(&g.privilege.as_str()) {
                result.add(&path, format!("unknown privilege {:?}", g.privilege));
            }
            if !seen.insert(g) {
                result.add(&path, "duplicate grant");
            }
        }
    }

    fn check_grantee(
        principal: &str,
        principal_type: &str,
        lookups: &Lookups<'_>,
        path: &str,
        result: &mut ValidationResult,
    ) {
        if principal.is_empty() {
            result.add(path, "principal is required");
        }
        if !GRANTEE_TYPES.contains(&principal_type) {
            result.add(
                path,
                format!("principal_type must be \"user\" or \"group\", got {:?}", principal_type),
            );
        } else if !principal.is_empty() && !lookups.principal_exists(principal, principal_type) {
            result.add(path, format!("principal {:?} references unknown {}", principal, principal_type));
        }
    }

    fn check_presets(state: &State, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, p) in state.privilege_presets.iter().enumerate() {
            let path = locator("preset", &p.name, i);
            if p.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(p.name.as_str()) {
                result.add(&path, format!("duplicate preset name {:?}", p.name));
            }
            if p.privileges.is_empty() {
                result.add(&path, "privileges must not be empty");
            }
            for privilege in &p.privileges {
                if !PRIVILEGES.contains(&privilege.as_str()) {
                    result.add(&path, format!("unknown privilege {:?}", privilege));
                }
            }
        }
    }

    fn check_bindings(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        for (i, b) in state.bindings.iter().enumerate() {
            let path = format!("binding[{}]", i);
            Self::check_grantee(&b.principal, &b.principal_type, lookups, &path, result);

            if b.preset.is_empty() {
                result.add(&path, "preset is required");
            } else if !lookups.presets.contains(b.preset.as_str()) {
                result.add(&path, format!("references unknown preset {:?}", b.preset));
            }

            if !SECURABLE_TYPES.contains(&b.scope_type.as_str()) {
                result.add(
                    &path,
                    format!("scope_type must be one of {}, got {:?}", one_of(SECURABLE_TYPES), b.scope_type),
                );
            }
            if b.scope.is_empty() {
                result.add(&path, "scope is required");
            } else if let Some(problem) = lookups.securable_problem(&b.scope_type, &b.scope) {
                result.add(&path, problem);
            }
        }
    }

    fn check_catalogs(state: &State, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, c) in state.catalogs.iter().enumerate() {
            let path = locator("catalog", &c.name, i);
            if c.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(c.name.as_str()) {
                result.add(&path, format!("duplicate catalog name {:?}", c.name));
            }
            if !METASTORE_TYPES.contains(&c.spec.metastore_type.as_str()) {
                result.add(
                    &path,
                    format!("metastore_type must be \"sqlite\" or \"postgres\", got {:?}", c.spec.metastore_type),
                );
            }
            if c.spec.dsn.is_empty() {
                result.add(&path, "dsn is required");
            }
            if c.spec.data_path.is_empty() {
                result.add(&path, "data_path is required");
            }
        }
    }

    fn check_schemas(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for s in &state.schemas {
            let key = s.full_name();
            let path = format!("schema[{}]", key);
            if !lookups.catalogs.contains(s.catalog.as_str()) {
                result.add(&path, format!("references unknown catalog {:?}", s.catalog));
            }
            if !seen.insert(key.clone()) {
                result.add(&path, format!("duplicate schema {:?}", key));
            }
        }
    }

    fn check_tables(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for t in &state.tables {
            let key = t.full_name();
            let path = format!("table[{}]", key);
            let schema_key = format!("{}.{}", t.catalog, t.schema);
            if !lookups.schemas.contains(&schema_key) {
                result.add(&path, format!("references unknown schema {:?}", schema_key));
            }

            let table_type = t.spec.table_type.as_str();
            if !table_type.is_empty() && !STORAGE_KINDS.contains(&table_type) {
                result.add(&path, format!("table_type must be \"MANAGED\" or \"EXTERNAL\", got {:?}", table_type));
            }
            if table_type == "EXTERNAL" {
                if t.spec.source_path.is_empty() {
                    result.add(&path, "source_path is required for EXTERNAL tables");
                }
                if t.spec.file_format.is_empty() {
                    result.add(&path, "file_format is required for EXTERNAL tables");
                }
            }

            let mut columns = HashSet::new();
            for (j, col) in t.spec.columns.iter().enumerate() {
                let col_path = format!("{}.columns[{}]", path, j);
                if col.name.is_empty() {
                    result.add(&col_path, "column name is required");
                } else if !columns.insert(col.name.as_str()) {
                    result.add(&col_path, format!("duplicate column name {:?}", col.name));
                }
                if col.column_type.is_empty() {
                    result.add(&col_path, "column type is required");
                }
            }

            if !seen.insert(key.clone()) {
                result.add(&path, format!("duplicate table {:?}", key));
            }
        }
    }

    fn check_views(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for v in &state.views {
            let key = v.full_name();
            let path = format!("view[{}]", key);
            let schema_key = format!("{}.{}", v.catalog, v.schema);
            if !lookups.schemas.contains(&schema_key) {
                result.add(&path, format!("references unknown schema {:?}", schema_key));
            }
            if v.spec.view_definition.is_empty() {
                result.add(&path, "view_definition is required");
            }
            if !seen.insert(key.clone()) {
                result.add(&path, format!("duplicate view {:?}", key));
            }
        }
    }

    fn check_volumes(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for v in &state.volumes {
            let key = v.full_name();
            let path = format!("volume[{}]", key);
            let schema_key = format!("{}.{}", v.catalog, v.schema);
            if !lookups.schemas.contains(&schema_key) {
                result.add(&path, format!("references unknown schema {:?}", schema_key));
            }

            let volume_type = v.spec.volume_type.as_str();
            if !volume_type.is_empty() && !STORAGE_KINDS.contains(&volume_type) {
                result.add(&path, format!("volume_type must be \"MANAGED\" or \"EXTERNAL\", got {:?}", volume_type));
            }
            if volume_type == "EXTERNAL" && v.spec.storage_location.is_empty() {
                result.add(&path, "storage_location is required for EXTERNAL volumes");
            }
            if !seen.insert(key.clone()) {
                result.add(&path, format!("duplicate volume {:?}", key));
            }
        }
    }

    fn check_row_filters(set: &RowFilterSet, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let table = set.table_name();
        let path = format!("row_filter[{}]", table);
        if !lookups.tables.contains(&table) {
            result.add(&path, format!("references unknown table {:?}", table));
        }

        let mut seen = HashSet::new();
        for (j, f) in set.filters.iter().enumerate() {
            let filter_path = format!("{}.{}", path, locator("filter", &f.name, j));
            if f.name.is_empty() {
                result.add(&filter_path, "filter name is required");
            } else if !seen.insert(f.name.as_str()) {
                result.add(&filter_path, format!("duplicate filter name {:?} within table {:?}", f.name, table));
            }
            if f.filter_sql.is_empty() {
                result.add(&filter_path, "filter_sql is required");
            }
            for (k, b) in f.bindings.iter().enumerate() {
                let binding_path = format!("{}.bindings[{}]", filter_path, k);
                Self::check_grantee(&b.principal, &b.principal_type, lookups, &binding_path, result);
            }
        }
    }

    fn check_column_masks(set: &ColumnMaskSet, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let table = set.table_name();
        let path = format!("column_mask[{}]", table);
        if !lookups.tables.contains(&table) {
            result.add(&path, format!("references unknown table {:?}", table));
        }

        let mut seen = HashSet::new();
        for (j, m) in set.masks.iter().enumerate() {
            let mask_path = format!("{}.{}", path, locator("mask", &m.name, j));
            if m.name.is_empty() {
                result.add(&mask_path, "mask name is required");
            } else if !seen.insert(m.name.as_str()) {
                result.add(&mask_path, format!("duplicate mask name {:?} within table {:?}", m.name, table));
            }
            if m.mask_expression.is_empty() {
                result.add(&mask_path, "mask_expression is required");
            }
            if m.column_name.is_empty() {
                result.add(&mask_path, "column_name is required");
            } else if let Some(problem) = lookups.missing_column(&table, &m.column_name) {
                result.add(&mask_path, problem);
            }
            for (k, b) in m.bindings.iter().enumerate() {
                let binding_path = format!("{}.bindings[{}]", mask_path, k);
                Self::check_grantee(&b.principal, &b.principal_type, lookups, &binding_path, result);
            }
        }
    }

    fn check_tags(state: &State, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, t) in state.tags.iter().enumerate() {
            if t.key.is_empty() {
                result.add(format!("tag[{}]", i), "key is required");
                continue;
            }
            let identity = t.identity();
            if !seen.insert(identity.clone()) {
                result.add(format!("tag[{}]", identity), format!("duplicate tag {:?}", identity));
            }
        }
    }

    fn check_tag_assignments(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        for (i, a) in state.tag_assignments.iter().enumerate() {
            let path = format!("tag_assignment[{}]", i);
            if a.tag.is_empty() {
                result.add(&path, "tag is required");
            } else if !lookups.tags.contains(&a.tag) {
                result.add(&path, format!("references unknown tag {:?}", a.tag));
            }
            if a.securable.is_empty() {
                result.add(&path, "securable is required");
            }

            match a.securable_type.as_str() {
                _ if a.securable.is_empty() => {}
                "schema" => {
                    if !lookups.schemas.contains(&a.securable) {
                        result.add(&path, format!("references unknown schema {:?}", a.securable));
                    }
                }
                "table" => {
                    if !lookups.tables.contains(&a.securable) {
                        result.add(&path, format!("references unknown table {:?}", a.securable));
                    }
                }
                "column" => {
                    if a.column_name.is_empty() {
                        result.add(&path, "column_name is required for column tag assignments");
                    }
                    if !lookups.tables.contains(&a.securable) {
                        result.add(&path, format!("references unknown table {:?}", a.securable));
                    } else if !a.column_name.is_empty() {
                        if let Some(problem) = lookups.missing_column(&a.securable, &a.column_name) {
                            result.add(&path, problem);
                        }
                    }
                }
                _ => {}
            }
            if !TAG_SECURABLE_TYPES.contains(&a.securable_type.as_str()) {
                result.add(
                    &path,
                    format!("securable_type must be one of {}, got {:?}", one_of(TAG_SECURABLE_TYPES), a.securable_type),
                );
            }
        }
    }

    fn check_storage_credentials(state: &State, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, c) in state.storage_credentials.iter().enumerate() {
            let path = locator("storage_credential", &c.name, i);
            if c.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(c.name.as_str()) {
                result.add(&path, format!("duplicate storage credential name {:?}", c.name));
            }

            match c.credential_type.as_str() {
                "S3" => match &c.s3 {
                    None => result.add(&path, "s3 spec is required when credential_type is \"S3\""),
                    Some(s3) => {
                        if s3.key_id_from_env.is_empty() {
                            result.add(&path, "s3.key_id_from_env is required");
                        }
                        if s3.secret_from_env.is_empty() {
                            result.add(&path, "s3.secret_from_env is required");
                        }
                    }
                },
                "AZURE" => match &c.azure {
                    None => result.add(&path, "azure spec is required when credential_type is \"AZURE\""),
                    Some(azure) if azure.account_name_from_env.is_empty() => {
                        result.add(&path, "azure.account_name_from_env is required");
                    }
                    Some(_) => {}
                },
                "GCS" => {
                    if c.gcs.is_none() {
                        result.add(&path, "gcs spec is required when credential_type is \"GCS\"");
                    }
                }
                other => {
                    result.add(
                        &path,
                        format!("credential_type must be one of {}, got {:?}", one_of(CREDENTIAL_TYPES), other),
                    );
                }
            }
        }
    }

    fn check_external_locations(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, l) in state.external_locations.iter().enumerate() {
            let path = locator("external_location", &l.name, i);
            if l.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(l.name.as_str()) {
                result.add(&path, format!("duplicate external location name {:?}", l.name));
            }
            if l.url.is_empty() {
                result.add(&path, "url is required");
            }
            if l.credential_name.is_empty() {
                result.add(&path, "credential_name is required");
            } else if !lookups.credentials.contains(l.credential_name.as_str()) {
                result.add(&path, format!("references unknown storage credential {:?}", l.credential_name));
            }
        }
    }

    fn check_compute(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, e) in state.compute_endpoints.iter().enumerate() {
            let path = locator("compute_endpoint", &e.name, i);
            if e.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(e.name.as_str()) {
                result.add(&path, format!("duplicate compute endpoint name {:?}", e.name));
            }
            if !COMPUTE_TYPES.contains(&e.endpoint_type.as_str()) {
                result.add(&path, format!("type must be \"LOCAL\" or \"REMOTE\", got {:?}", e.endpoint_type));
            }
            if e.endpoint_type == "REMOTE" && e.url.is_empty() {
                result.add(&path, "url is required for REMOTE compute endpoints");
            }
        }

        let mut assigned = HashSet::new();
        for (i, a) in state.compute_assignments.iter().enumerate() {
            let path = format!("compute_assignment[{}]", i);
            if a.endpoint.is_empty() {
                result.add(&path, "endpoint is required");
            } else if !lookups.endpoints.contains(a.endpoint.as_str()) {
                result.add(&path, format!("references unknown compute endpoint {:?}", a.endpoint));
            }
            Self::check_grantee(&a.principal, &a.principal_type, lookups, &path, result);
            if !assigned.insert(a.identity()) {
                result.add(&path, "duplicate compute assignment");
            }
        }
    }

    fn check_api_keys(state: &State, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, k) in state.api_keys.iter().enumerate() {
            let path = locator("api_key", &k.name, i);
            if k.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(k.name.as_str()) {
                result.add(&path, format!("duplicate API key name {:?}", k.name));
            }
            if k.principal.is_empty() {
                result.add(&path, "principal is required");
            } else if !lookups.principals.contains(k.principal.as_str()) {
                result.add(&path, format!("references unknown principal {:?}", k.principal));
            }
            if let Some(expires_at) = k.expires_at.as_deref().filter(|s| !s.is_empty()) {
                if DateTime::parse_from_rfc3339(expires_at).is_err() {
                    result.add(&path, format!("expires_at must be an RFC3339 timestamp, got {:?}", expires_at));
                }
            }
        }
    }

    fn check_notebooks(state: &State, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, n) in state.notebooks.iter().enumerate() {
            let path = locator("notebook", &n.name, i);
            if n.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(n.name.as_str()) {
                result.add(&path, format!("duplicate notebook name {:?}", n.name));
            }
            for (j, cell) in n.spec.cells.iter().enumerate() {
                let cell_path = format!("{}.cells[{}]", path, j);
                if !CELL_TYPES.contains(&cell.cell_type.as_str()) {
                    result.add(&cell_path, format!("cell type must be \"sql\" or \"markdown\", got {:?}", cell.cell_type));
                }
                if cell.content.is_empty() {
                    result.add(&cell_path, "content is required");
                }
            }
        }
    }

    fn check_pipeline(&self, pipeline: &PipelineResource, lookups: &Lookups<'_>, result: &mut ValidationResult) {
        let path = format!("pipeline[{}]", pipeline.name);
        let spec = &pipeline.spec;

        if !spec.schedule_cron.is_empty() && !self.cron_pattern.is_match(spec.schedule_cron.trim()) {
            result.add(&path, format!("schedule_cron must have five fields, got {:?}", spec.schedule_cron));
        }
        if matches!(spec.concurrency_limit, Some(n) if n < 1) {
            result.add(&path, "concurrency_limit must be at least 1");
        }

        let job_names: HashSet<&str> = spec.jobs.iter().map(|j| j.name.as_str()).collect();
        let mut seen = HashSet::new();
        for (j, job) in spec.jobs.iter().enumerate() {
            let job_path = format!("{}.{}", path, locator("job", &job.name, j));
            if job.name.is_empty() {
                result.add(&job_path, "job name is required");
            } else if !seen.insert(job.name.as_str()) {
                result.add(&job_path, format!("duplicate job name {:?} within pipeline {:?}", job.name, pipeline.name));
            }
            if job.notebook.is_empty() {
                result.add(&job_path, "notebook is required");
            } else if !lookups.notebooks.contains(job.notebook.as_str()) {
                result.add(&job_path, format!("references unknown notebook {:?}", job.notebook));
            }
            if !job.compute_endpoint.is_empty() && !lookups.endpoints.contains(job.compute_endpoint.as_str()) {
                result.add(&job_path, format!("references unknown compute endpoint {:?}", job.compute_endpoint));
            }
            for dep in &job.depends_on {
                if !job_names.contains(dep.as_str()) {
                    result.add(
                        &job_path,
                        format!("depends_on references unknown job {:?} in pipeline {:?}", dep, pipeline.name),
                    );
                }
            }
        }

        let cycles = find_cycles(
            &spec.jobs,
            |j| j.name.as_str(),
            |j| j.depends_on.iter().map(String::as_str).collect(),
        );
        for cycle in cycles {
            result.add(&path, format!("circular job dependency detected: {}", cycle.join(" -> ")));
        }
    }

    fn check_pipeline_names(state: &State, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, p) in state.pipelines.iter().enumerate() {
            let path = locator("pipeline", &p.name, i);
            if p.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(p.name.as_str()) {
                result.add(&path, format!("duplicate pipeline name {:?}", p.name));
            }
        }
    }

    fn check_models(models: &[ModelResource], result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for m in models {
            let key = m.full_name();
            let path = format!("model[{}]", key);
            let spec = &m.spec;

            if spec.sql.is_empty() {
                result.add(&path, "sql is required");
            }
            let materialization = spec.materialization.as_str();
            if !materialization.is_empty() && !MATERIALIZATIONS.contains(&materialization) {
                result.add(
                    &path,
                    format!("materialization must be one of {}, got {:?}", one_of(MATERIALIZATIONS), materialization),
                );
            }
            if materialization == "INCREMENTAL"
                && spec.config.as_ref().map_or(true, |c| c.unique_key.is_empty())
            {
                result.add(&path, "config.unique_key is required for INCREMENTAL models");
            }

            let mut contract_columns = HashSet::new();
            if let Some(contract) = &spec.contract {
                for (i, col) in contract.columns.iter().enumerate() {
                    let col_path = format!("{}.contract.columns[{}]", path, i);
                    if col.name.is_empty() {
                        result.add(&col_path, "column name is required");
                    } else if !contract_columns.insert(col.name.as_str()) {
                        result.add(&col_path, format!("duplicate contract column name {:?}", col.name));
                    }
                    if col.column_type.is_empty() {
                        result.add(&col_path, "column type is required");
                    }
                }
            }

            let mut tests = HashSet::new();
            for (i, t) in spec.tests.iter().enumerate() {
                let test_path = format!("{}.{}", path, locator("tests", &t.name, i));
                if t.name.is_empty() {
                    result.add(&test_path, "test name is required");
                } else if !tests.insert(t.name.as_str()) {
                    result.add(&test_path, format!("duplicate test name {:?}", t.name));
                }

                let needs_column = matches!(
                    t.test_type.as_str(),
                    "not_null" | "unique" | "accepted_values" | "relationships"
                );
                if needs_column && t.column.is_empty() {
                    result.add(&test_path, format!("column is required for {} tests", t.test_type));
                }
                match t.test_type.as_str() {
                    "accepted_values" if t.values.is_empty() => {
                        result.add(&test_path, "values are required for accepted_values tests");
                    }
                    "relationships" if t.to_model.is_empty() || t.to_column.is_empty() => {
                        result.add(&test_path, "to_model and to_column are required for relationships tests");
                    }
                    "custom_sql" if t.sql.is_empty() => {
                        result.add(&test_path, "sql is required for custom_sql tests");
                    }
                    other if !TEST_TYPES.contains(&other) => {
                        result.add(&test_path, format!("test type must be one of {}, got {:?}", one_of(TEST_TYPES), other));
                    }
                    _ => {}
                }

                if !t.column.is_empty() && !contract_columns.is_empty() && !contract_columns.contains(t.column.as_str()) {
                    result.add(&test_path, format!("column {:?} not found in contract", t.column));
                }
            }

            if !seen.insert(key.clone()) {
                result.add(&path, format!("duplicate model {:?}", key));
            }
        }
    }

    fn check_macros(state: &State, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, m) in state.macros.iter().enumerate() {
            let path = locator("macro", &m.name, i);
            if m.name.is_empty() {
                result.add(&path, "name is required");
            } else if !seen.insert(m.name.as_str()) {
                result.add(&path, format!("duplicate macro name {:?}", m.name));
            }
            if m.spec.body.is_empty() {
                result.add(&path, "body is required");
            }
            if !MACRO_TYPES.contains(&m.spec.macro_type.as_str()) {
                result.add(&path, format!("macro_type must be \"SCALAR\" or \"TABLE\", got {:?}", m.spec.macro_type));
            }
        }
    }
}
