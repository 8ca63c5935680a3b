//! Comma-separated output
//!
//! Every column is written, suppressed or not; spreadsheet users hide
//! columns themselves.

use crate::core::report::ReportTable;

use super::RenderError;

/// Header row plus one record per line item, RFC 4180 quoting
pub fn render_csv(table: &ReportTable) -> Result<String, RenderError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| RenderError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
