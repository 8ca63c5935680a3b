//! JSON dump of the report table

use crate::core::report::ReportTable;

use super::RenderError;

pub fn render_json(table: &ReportTable) -> Result<String, RenderError> {
    let mut out = serde_json::to_string_pretty(table)?;
    out.push('\n');
    Ok(out)
}
