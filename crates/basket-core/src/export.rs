//! List export helpers shared by clients.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CategoryId, Item, ListDocument};
use crate::tree::build_tree;

/// Export output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Render the full document, tombstones and sync metadata included.
pub fn render_json_export(doc: &ListDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

fn push_items(output: &mut String, items: &[&Item]) {
    for item in items {
        let mark = if item.checked { 'x' } else { ' ' };
        let _ = writeln!(output, "- [{mark}] {item}");
    }
}

/// Render live categories as nested headings, each followed by its own items.
///
/// Items whose category is missing from the tree are listed under the root.
#[must_use]
pub fn render_markdown_export(doc: &ListDocument) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {}", doc.title);

    let Some(tree) = build_tree(&doc.categories) else {
        let items = doc.visible_items(&CategoryId::root(), false);
        if !items.is_empty() {
            output.push('\n');
            push_items(&mut output, &items);
        }
        return output;
    };

    let placed = tree.walk().map(|(c, _)| &c.id).collect::<HashSet<_>>();
    for (category, depth) in tree.walk() {
        let items = doc
            .visible_items(&CategoryId::root(), false)
            .into_iter()
            .filter(|item| {
                item.category_id == category.id
                    || (depth == 0 && !placed.contains(&item.category_id))
            })
            .collect::<Vec<_>>();

        let level = "#".repeat((depth + 2).min(6));
        let _ = writeln!(output, "\n{level} {}", category.name);
        push_items(&mut output, &items);
    }

    output
}

/// Render a list in the selected export format.
pub fn render_list_export(doc: &ListDocument, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => render_json_export(doc),
        ExportFormat::Markdown => Ok(render_markdown_export(doc)),
    }
}

/// Default export file name derived from the list title.
#[must_use]
pub fn suggested_export_file_name(doc: &ListDocument, format: ExportFormat) -> String {
    let slug = doc
        .title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    let stem = if slug.is_empty() { "list" } else { &slug };
    format!("{stem}.{}", format.extension())
}
