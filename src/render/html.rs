//! HTML output rendered from the embedded `bom.html` template
//!
//! Suppressed columns stay in the markup with `class="hide"` so the page can
//! be restyled without regenerating it.

use serde::Serialize;
use tera::{Context, Tera};

use crate::core::report::ReportTable;

use super::{asset_str, RenderError, RenderOptions};

const TEMPLATE: &str = "bom.html";

#[derive(Debug, Serialize)]
struct HeaderCell<'a> {
    text: &'a str,
    visible: bool,
}

#[derive(Debug, Serialize)]
struct Cell<'a> {
    text: &'a str,
    visible: bool,
    href: Option<String>,
}

pub fn render_html(table: &ReportTable, options: &RenderOptions) -> Result<String, RenderError> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE, &asset_str(TEMPLATE)?)?;

    let header: Vec<HeaderCell> = table
        .header
        .iter()
        .enumerate()
        .map(|(i, text)| HeaderCell {
            text,
            visible: table.visibility.is_visible(i),
        })
        .collect();

    let rows: Vec<Vec<Cell>> = table
        .rows
        .iter()
        .map(|row| {
            let href = table.link.as_ref().and_then(|link| {
                link.href(row).map(|href| (link.column, href))
            });
            row.iter()
                .enumerate()
                .map(|(i, text)| Cell {
                    text,
                    visible: table.visibility.is_visible(i),
                    href: href
                        .as_ref()
                        .filter(|(column, _)| *column == i)
                        .map(|(_, href)| escape_href(href)),
                })
                .collect()
        })
        .collect();

    let mut context = Context::new();
    context.insert("title", &table.title);
    context.insert("metadata", &table.metadata);
    context.insert("header", &header);
    context.insert("rows", &rows);
    context.insert("summary", &table.summary);
    context.insert("field", &options.field_name);
    context.insert(
        "generated",
        &chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
    );

    Ok(tera.render(TEMPLATE, &context)?)
}

/// HTML-escape a link target for an attribute, keeping `/` readable
///
/// The template marks the result `safe`, so this is the only escaping it gets.
fn escape_href(href: &str) -> String {
    tera::escape_html(href).replace("&#x2F;", "/")
}
