mod grants;
mod json;
mod text;

pub use grants::{render_grants_json, render_grants_table, GrantRow};
pub use json::render_json;
pub use text::{format_line_diff, render_text, TextOptions};
