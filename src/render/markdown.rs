//! Markdown output
//!
//! Only visible columns are written; a Markdown table has no way to hide one.

use tabled::{builder::Builder, settings::Style};

use crate::core::report::ReportTable;

use super::RenderOptions;

pub fn render_markdown(table: &ReportTable, options: &RenderOptions) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", table.title));

    if let Some(ref date) = table.metadata.date {
        output.push_str(&format!("Date: {}\n", date));
    }
    if let Some(ref source) = table.metadata.source {
        output.push_str(&format!("Source: {}\n", source));
    }
    output.push('\n');

    let mut builder = Builder::default();
    builder.push_record(table.visible_header().into_iter().map(escape_cell));
    for row in &table.rows {
        builder.push_record(table.visible_row(row).into_iter().map(escape_cell));
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());
    output.push('\n');

    let summary = &table.summary;
    output.push_str(&format!(
        "\n*{} line items, {} part references*\n",
        summary.line_items, summary.total_references
    ));
    if !summary.unresolved.is_empty() {
        output.push_str(&format!(
            "\n**References without {} field:** {}\n",
            options.field_name,
            summary.unresolved.join(", ")
        ));
    }
    if !summary.missing.is_empty() {
        output.push_str("\n**Not in catalog:**\n\n");
        for group in &summary.missing {
            output.push_str(&format!(
                "- {} ({})\n",
                group.part_id,
                group.joined_references()
            ));
        }
    }

    output
}

/// Keep a cell on one table line: pipes escaped, line breaks as `<br>`
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}
