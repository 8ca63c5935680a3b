//! Report renderers
//!
//! Every renderer consumes a finished [`ReportTable`]. All formats are rendered
//! before any file is written; when a write fails, files written before it
//! stay on disk.

mod delimited;
mod html;
mod json;
mod markdown;

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use miette::Diagnostic;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::report::ReportTable;

pub use self::delimited::render_csv;
pub use self::html::render_html;
pub use self::json::render_json;
pub use self::markdown::render_markdown;

/// File name of the stylesheet written next to HTML output
pub const STYLESHEET: &str = "style.css";

#[derive(Embed)]
#[folder = "templates/"]
struct Assets;

#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    #[error("Failed to write {}", path.display())]
    #[diagnostic(
        code(tbom::render::write),
        help("Check that the output directory exists and is writable. Files written before this one were left in place.")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV output failed")]
    #[diagnostic(code(tbom::render::csv))]
    Csv(#[from] csv::Error),

    #[error("HTML template error")]
    #[diagnostic(code(tbom::render::template))]
    Template(#[from] tera::Error),

    #[error("JSON output failed")]
    #[diagnostic(code(tbom::render::json))]
    Json(#[from] serde_json::Error),

    #[error("Embedded asset `{0}` is missing")]
    #[diagnostic(code(tbom::render::asset))]
    MissingAsset(&'static str),
}

/// Output format of a report file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Comma-separated values (for spreadsheets)
    Csv,
    /// HTML page with optional hidden columns and datasheet links
    Html,
    /// Markdown table
    Md,
    /// JSON dump of the full table and summary
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Html => "html",
            ReportFormat::Md => "md",
            ReportFormat::Json => "json",
        }
    }

    /// Render the table in this format
    pub fn render(&self, table: &ReportTable, options: &RenderOptions) -> Result<String, RenderError> {
        match self {
            ReportFormat::Csv => render_csv(table),
            ReportFormat::Html => render_html(table, options),
            ReportFormat::Md => Ok(render_markdown(table, options)),
            ReportFormat::Json => render_json(table),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Settings shared by the renderers
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub formats: Vec<ReportFormat>,
    /// Write style.css beside HTML output
    pub stylesheet: bool,
    /// Schematic field name, quoted in the unresolved-reference notes
    pub field_name: String,
}

/// `<base>.<ext>`, keeping any dots already in the base name
pub fn output_path(base: &Path, format: ReportFormat) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(format.extension());
    PathBuf::from(path)
}

/// Location of the stylesheet for a given output base
pub fn stylesheet_path(base: &Path) -> PathBuf {
    base.parent()
        .map(|dir| dir.join(STYLESHEET))
        .unwrap_or_else(|| PathBuf::from(STYLESHEET))
}

/// Render and write every requested format, returning the files written
pub fn write_all(
    table: &ReportTable,
    base: &Path,
    options: &RenderOptions,
) -> Result<Vec<PathBuf>, RenderError> {
    // Render everything before touching the filesystem
    let rendered = options
        .formats
        .iter()
        .map(|format| Ok((*format, format.render(table, options)?)))
        .collect::<Result<Vec<_>, RenderError>>()?;

    let mut written = Vec::new();
    for (format, content) in rendered {
        let path = output_path(base, format);
        write_file(&path, content.as_bytes())?;
        tracing::debug!(path = %path.display(), format = %format, "report written");
        written.push(path);
    }

    if options.stylesheet && options.formats.contains(&ReportFormat::Html) {
        let css = Assets::get(STYLESHEET).ok_or(RenderError::MissingAsset(STYLESHEET))?;
        let path = stylesheet_path(base);
        write_file(&path, &css.data)?;
        written.push(path);
    }

    Ok(written)
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), RenderError> {
    std::fs::write(path, content).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Embedded text asset by file name
fn asset_str(name: &'static str) -> Result<String, RenderError> {
    let file = Assets::get(name).ok_or(RenderError::MissingAsset(name))?;
    Ok(String::from_utf8_lossy(&file.data).into_owned())
}
