use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use crate::error::Result;
use crate::state::Grant;

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct GrantRow {
    #[tabled(rename = "Principal")]
    pub principal: String,
    #[tabled(rename = "Type")]
    pub principal_type: String,
    #[tabled(rename = "Securable")]
    pub securable: String,
    #[tabled(rename = "Privilege")]
    pub privilege: String,
}

impl From<&Grant> for GrantRow {
    fn from(g: &Grant) -> Self {
        Self {
            principal: g.principal.clone(),
            principal_type: g.principal_type.clone(),
            securable: format!("{} {}", g.securable_type, g.securable),
            privilege: g.privilege.clone(),
        }
    }
}

pub fn render_grants_table(grants: &[Grant]) -> String {
    let rows: Vec<GrantRow> = grants.iter().map(GrantRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::markdown());
    table.to_string()
}

pub fn render_grants_json(grants: &[Grant]) -> Result<String> {
    Ok(serde_json::to_string_pretty(grants)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_each_grant() {
        let grants = vec![
            Grant::new("alice", "user", "catalog", "main", "USE_CATALOG"),
            Grant::new("analysts", "group", "schema", "main.sales", "SELECT"),
        ];
        let table = render_grants_table(&grants);
        assert!(table.contains("Principal"));
        assert!(table.contains("schema main.sales"));
        assert!(table.contains("USE_CATALOG"));
        assert_eq!(table.lines().count(), 4);
    }
}
