use std::cmp::Ordering;
use serde::Serialize;
use crate::model::{Operation, ResourceKind};

/// One field that differs between actual and desired, both rendered as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

impl FieldDiff {
    pub fn new(field: impl Into<String>, old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }

    pub fn is_multiline(&self) -> bool {
        self.old_value.contains('\n') || self.new_value.contains('\n')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub operation: Operation,
    #[serde(rename = "resource_type")]
    pub kind: ResourceKind,
    #[serde(rename = "resource_name")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldDiff>,
}

impl Action {
    pub fn create(kind: ResourceKind, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            operation: Operation::Create,
            kind,
            name: name.into(),
            path: Some(path.into()),
            changes: Vec::new(),
        }
    }

    pub fn update(
        kind: ResourceKind,
        name: impl Into<String>,
        path: impl Into<String>,
        changes: Vec<FieldDiff>,
    ) -> Self {
        Self {
            operation: Operation::Update,
            kind,
            name: name.into(),
            path: Some(path.into()),
            changes,
        }
    }

    pub fn delete(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            operation: Operation::Delete,
            kind,
            name: name.into(),
            path: None,
            changes: Vec::new(),
        }
    }

    pub fn layer(&self) -> u8 {
        self.kind.layer()
    }

    /// Parents are created before children and deleted after them, also when
    /// both share a layer (pipelines and their jobs).
    fn sort_key(&self) -> (u8, i16, bool) {
        let child = self.kind.is_child();
        match self.operation {
            Operation::Create | Operation::Update => (0, self.layer() as i16, child),
            Operation::Delete => (1, -(self.layer() as i16), !child),
        }
    }
}

/// A problem the plan cannot resolve on its own; the operator has to change
/// the desired state or the protection setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanError {
    pub resource_type: ResourceKind,
    pub resource_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub errors: Vec<PlanError>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn error(&mut self, kind: ResourceKind, name: impl Into<String>, message: impl Into<String>) {
        self.errors.push(PlanError {
            resource_type: kind,
            resource_name: name.into(),
            message: message.into(),
        });
    }

    pub fn has_changes(&self) -> bool {
        !self.actions.is_empty() || !self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            errors: self.errors.len(),
            ..Default::default()
        };
        for action in &self.actions {
            match action.operation {
                Operation::Create => summary.creates += 1,
                Operation::Update => summary.updates += 1,
                Operation::Delete => summary.deletes += 1,
            }
        }
        summary
    }

    /// Orders actions for execution: creates and updates by ascending layer,
    /// then deletes by descending layer. Within a layer a child kind is deleted
    /// before its parent kind; remaining ties go by name. The sort is stable.
    pub fn sort_actions(&mut self) {
        self.actions.sort_by(compare_actions);
    }
}

fn compare_actions(a: &Action, b: &Action) -> Ordering {
    a.sort_key()
        .cmp(&b.sort_key())
        .then_with(|| a.name.cmp(&b.name))
}
