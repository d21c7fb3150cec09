use std::collections::BTreeMap;
use crate::model::ResourceKind;
use super::plan::{Action, FieldDiff, Plan};

/// Stable `k=v, k=v` rendering; key order never produces a spurious diff.
pub fn render_map(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Field diffs accumulated for one resource.
#[derive(Debug, Default)]
pub(crate) struct Changes(Vec<FieldDiff>);

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, field: &str, old: &str, new: &str) -> &mut Self {
        if old != new {
            self.0.push(FieldDiff::new(field, old, new));
        }
        self
    }

    pub fn flag(&mut self, field: &str, old: bool, new: bool) -> &mut Self {
        self.text(field, &old.to_string(), &new.to_string())
    }

    /// Absent numbers render as the empty string.
    pub fn number(&mut self, field: &str, old: Option<i64>, new: Option<i64>) -> &mut Self {
        let render = |n: Option<i64>| n.map(|n| n.to_string()).unwrap_or_default();
        self.text(field, &render(old), &render(new))
    }

    pub fn optional(&mut self, field: &str, old: Option<&str>, new: Option<&str>) -> &mut Self {
        self.text(field, old.unwrap_or_default(), new.unwrap_or_default())
    }

    pub fn map(&mut self, field: &str, old: &BTreeMap<String, String>, new: &BTreeMap<String, String>) -> &mut Self {
        self.text(field, &render_map(old), &render_map(new))
    }

    /// Ordered list, joined with ", ".
    pub fn list(&mut self, field: &str, old: &[String], new: &[String]) -> &mut Self {
        self.text(field, &old.join(", "), &new.join(", "))
    }

    /// Unordered list, sorted before joining.
    pub fn set(&mut self, field: &str, old: &[String], new: &[String]) -> &mut Self {
        let render = |items: &[String]| {
            let mut sorted = items.to_vec();
            sorted.sort();
            sorted.join(",")
        };
        self.text(field, &render(old), &render(new))
    }

    /// Collections shown by size only; any difference in content surfaces as `N <unit>`.
    pub fn counted<T: PartialEq>(&mut self, field: &str, old: &[T], new: &[T], unit: &str) -> &mut Self {
        if old != new {
            self.0.push(FieldDiff::new(
                field,
                format!("{} {}", old.len(), unit),
                format!("{} {}", new.len(), unit),
            ));
        }
        self
    }

    pub fn push(&mut self, diff: FieldDiff) {
        self.0.push(diff);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records an update when at least one field changed.
    pub fn emit(self, plan: &mut Plan, kind: ResourceKind, name: &str, path: &str) {
        if !self.0.is_empty() {
            plan.push(Action::update(kind, name, path, self.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_map_sorted() {
        let mut map = BTreeMap::new();
        map.insert("owner".to_string(), "data".to_string());
        map.insert("env".to_string(), "prod".to_string());
        assert_eq!(render_map(&map), "env=prod, owner=data");
        assert_eq!(render_map(&BTreeMap::new()), "");
    }

    #[test]
    fn test_equal_values_record_nothing() {
        let mut changes = Changes::new();
        changes
            .text("comment", "a", "a")
            .flag("is_default", true, true)
            .number("max_memory_gb", None, None)
            .set("depends_on", &["b".into(), "a".into()], &["a".into(), "b".into()]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_number_renders_absent_as_empty() {
        let mut changes = Changes::new();
        changes.number("retry_count", None, Some(3));
        assert_eq!(changes.0, vec![FieldDiff::new("retry_count", "", "3")]);
    }

    #[test]
    fn test_counted() {
        let mut changes = Changes::new();
        changes.counted("cells", &[1, 2], &[1, 3], "cells");
        assert_eq!(changes.0, vec![FieldDiff::new("cells", "2 cells", "2 cells")]);
    }
}
