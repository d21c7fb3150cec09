//! Canonical document locations, relative to the config root. The loader reads
//! from them, the exporter writes to them and plan actions report them.

pub const PRINCIPALS: &str = "security/principals.yaml";
pub const GROUPS: &str = "security/groups.yaml";
pub const GRANTS: &str = "security/grants.yaml";
pub const PRIVILEGE_PRESETS: &str = "security/privilege-presets.yaml";
pub const BINDINGS: &str = "security/bindings.yaml";
pub const API_KEYS: &str = "security/api-keys.yaml";
pub const TAGS: &str = "governance/tags.yaml";
pub const STORAGE_CREDENTIALS: &str = "storage/credentials.yaml";
pub const EXTERNAL_LOCATIONS: &str = "storage/locations.yaml";
pub const COMPUTE_ENDPOINTS: &str = "compute/endpoints.yaml";
pub const COMPUTE_ASSIGNMENTS: &str = "compute/assignments.yaml";

pub fn catalog(catalog: &str) -> String {
    format!("catalogs/{}/catalog.yaml", catalog)
}

pub fn schema(catalog: &str, schema: &str) -> String {
    format!("catalogs/{}/schemas/{}/schema.yaml", catalog, schema)
}

fn table_dir(catalog: &str, schema: &str, table: &str) -> String {
    format!("catalogs/{}/schemas/{}/tables/{}", catalog, schema, table)
}

pub fn table(catalog: &str, schema: &str, table: &str) -> String {
    format!("{}/table.yaml", table_dir(catalog, schema, table))
}

pub fn row_filters(catalog: &str, schema: &str, table: &str) -> String {
    format!("{}/row-filters.yaml", table_dir(catalog, schema, table))
}

pub fn column_masks(catalog: &str, schema: &str, table: &str) -> String {
    format!("{}/column-masks.yaml", table_dir(catalog, schema, table))
}

pub fn view(catalog: &str, schema: &str, view: &str) -> String {
    format!("catalogs/{}/schemas/{}/views/{}.yaml", catalog, schema, view)
}

pub fn volume(catalog: &str, schema: &str, volume: &str) -> String {
    format!("catalogs/{}/schemas/{}/volumes/{}.yaml", catalog, schema, volume)
}

pub fn notebook(name: &str) -> String {
    format!("notebooks/{}.yaml", name)
}

pub fn pipeline(name: &str) -> String {
    format!("pipelines/{}.yaml", name)
}

pub fn model(project: &str, name: &str) -> String {
    format!("models/{}/{}.yaml", project, name)
}

pub fn macro_def(name: &str) -> String {
    format!("macros/{}.yaml", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_paths() {
        assert_eq!(
            table("main", "sales", "orders"),
            "catalogs/main/schemas/sales/tables/orders/table.yaml"
        );
        assert_eq!(
            column_masks("main", "sales", "orders"),
            "catalogs/main/schemas/sales/tables/orders/column-masks.yaml"
        );
        assert_eq!(view("main", "sales", "v"), "catalogs/main/schemas/sales/views/v.yaml");
        assert_eq!(model("analytics", "stg"), "models/analytics/stg.yaml");
    }
}
