use std::fmt::Write;
use colored::{ColoredString, Colorize};
use similar::{ChangeTag, TextDiff};
use crate::diff::{Action, FieldDiff, Plan};
use crate::model::Operation;

/// Rendering switches for the human-readable plan.
#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    pub color: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self { color: true }
    }
}

impl TextOptions {
    pub fn plain() -> Self {
        Self { color: false }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}

fn green(s: &str) -> ColoredString {
    s.green()
}

fn yellow(s: &str) -> ColoredString {
    s.yellow()
}

fn red(s: &str) -> ColoredString {
    s.red()
}

fn cyan(s: &str) -> ColoredString {
    s.cyan()
}

fn dimmed(s: &str) -> ColoredString {
    s.dimmed()
}

/// Line-by-line diff of two multi-line values, each line prefixed with `indent`.
pub fn format_line_diff(old: &str, new: &str, indent: &str, options: &TextOptions) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let line = change.to_string();
        let line = line.trim_end();
        let formatted = match change.tag() {
            ChangeTag::Delete => options.paint(&format!("- {}", line), red),
            ChangeTag::Insert => options.paint(&format!("+ {}", line), green),
            ChangeTag::Equal => format!("  {}", line),
        };
        output.push_str(indent);
        output.push_str(&formatted);
        output.push('\n');
    }

    output
}

fn render_change(out: &mut String, change: &FieldDiff, options: &TextOptions) {
    if change.is_multiline() {
        let _ = writeln!(out, "      {}:", change.field);
        out.push_str(&format_line_diff(&change.old_value, &change.new_value, "        ", options));
    } else {
        let _ = writeln!(out, "      {}: {:?} → {:?}", change.field, change.old_value, change.new_value);
    }
}

fn render_action(out: &mut String, action: &Action, options: &TextOptions) {
    let (style, verb): (fn(&str) -> ColoredString, &str) = match action.operation {
        Operation::Create => (green, "created"),
        Operation::Update => (yellow, "updated"),
        Operation::Delete => (red, "deleted"),
    };
    let _ = writeln!(
        out,
        "  {} {} {:?} will be {}",
        options.paint(action.operation.symbol(), style),
        action.kind,
        action.name,
        verb
    );
    for change in &action.changes {
        render_change(out, change, options);
    }
}

/// Actions grouped by source document in first-seen order, then errors, then
/// a one-line summary.
pub fn render_text(plan: &Plan, options: &TextOptions) -> String {
    if !plan.has_changes() {
        return "No changes. Infrastructure is up-to-date.\n".to_string();
    }

    let mut groups: Vec<(Option<&str>, Vec<&Action>)> = Vec::new();
    for action in &plan.actions {
        let path = action.path.as_deref();
        match groups.iter_mut().find(|(p, _)| *p == path) {
            Some((_, actions)) => actions.push(action),
            None => groups.push((path, vec![action])),
        }
    }

    let mut out = String::new();
    for (path, actions) in &groups {
        let header = format!("# {}", path.unwrap_or("(server-only)"));
        let _ = writeln!(out, "\n{}", options.paint(&header, cyan));
        for action in actions {
            render_action(&mut out, action, options);
        }
    }

    if !plan.errors.is_empty() {
        out.push('\n');
    }
    for e in &plan.errors {
        let _ = writeln!(
            out,
            "  {} {} {:?}: {}",
            options.paint("✗", red),
            e.resource_type,
            e.resource_name,
            e.message
        );
    }

    let summary = plan.summary();
    let _ = write!(
        out,
        "\n{} {} to create, {} to update, {} to delete.",
        options.paint("Plan:", dimmed),
        summary.creates,
        summary.updates,
        summary.deletes
    );
    if summary.errors > 0 {
        let _ = write!(out, " {}", options.paint(&format!("{} error(s).", summary.errors), red));
    }
    out.push('\n');
    out
}
