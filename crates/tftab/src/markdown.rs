//! markdown table rendering and output-file merging
//!
//! One table per requested resource type. The identity column links to
//! the declaration site as `[`name`](relative/path#L<line>)`; the
//! remaining columns are the requested attributes in request order.
//!
//! Generated content is fenced between [BEGIN_MARKER] and
//! [END_MARKER] so repeated runs replace their own output inside an
//! otherwise hand-written document.

use crate::inputs::ResourceTypeSpec;
use crate::module::SourcePos;
use crate::value::AttributeValue;
use indexmap::IndexMap;
use std::path::Path;

pub const BEGIN_MARKER: &str = "<!-- BEGIN_TF_RESOURCE_TABLES -->";
pub const END_MARKER: &str = "<!-- END_TF_RESOURCE_TABLES -->";

/// One table row: a resource and its resolved attribute values
#[derive(Debug)]
pub struct ResourceRow {
    pub name: String,
    pub pos: SourcePos,
    pub attributes: IndexMap<String, AttributeValue>,
}

/// Append the table for one resource type to `out`.
///
/// Declaration links are rendered relative to `dir`, the module
/// directory.
pub fn write_table(
    dir: &Path,
    spec: &ResourceTypeSpec,
    rows: &[ResourceRow],
    header_level: usize,
    out: &mut String,
) {
    out.push_str(&format!("{} {}\n\n", "#".repeat(header_level), spec.name));

    out.push_str("| **Name** |");
    for attribute in &spec.attributes {
        out.push_str(&format!(" `{attribute}` |"));
    }
    out.push('\n');

    out.push_str("| --- |");
    for _ in &spec.attributes {
        out.push_str(" --- |");
    }
    out.push('\n');

    for row in rows {
        out.push_str(&format!("| {} |", name_link(dir, row)));
        for attribute in &spec.attributes {
            let cell = row
                .attributes
                .get(attribute)
                .map(value_to_markdown)
                .unwrap_or_default();
            out.push_str(&format!(" {cell} |"));
        }
        out.push('\n');
    }

    out.push('\n');
}

fn name_link(dir: &Path, row: &ResourceRow) -> String {
    let path = row.pos.path.strip_prefix(dir).unwrap_or(&row.pos.path);
    format!("[`{}`]({}#L{})", row.name, path.display(), row.pos.line)
}

/// Natural string form of a value; `Unknown` renders as `_unknown_`
pub fn value_to_markdown(value: &AttributeValue) -> String {
    match value {
        AttributeValue::String(s) => s.clone(),
        AttributeValue::Number(n) => format!("{n}"),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Unknown(_) => "_unknown_".to_string(),
    }
}

/// Merge generated content into an existing document.
///
/// When the document carries both fences in order, the span between
/// them is replaced. Otherwise a fenced block is appended, separated
/// from existing content by a newline.
pub fn merge_into(existing: &str, generated: &str) -> String {
    match fence_indexes(existing) {
        Some((start, end)) => format!(
            "{}{BEGIN_MARKER}\n{generated}\n{}",
            &existing[..start],
            &existing[end..]
        ),
        None => {
            let mut out = String::from(existing);
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(BEGIN_MARKER);
            out.push('\n');
            out.push_str(generated);
            out.push('\n');
            out.push_str(END_MARKER);
            out.push('\n');
            out
        }
    }
}

fn fence_indexes(text: &str) -> Option<(usize, usize)> {
    let start = text.find(BEGIN_MARKER)?;
    let end = text.find(END_MARKER)?;
    (end >= start).then_some((start, end))
}
