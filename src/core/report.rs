//! Report assembly - header, row order and column annotations
//!
//! The assembler turns resolved line items into a format-agnostic table.
//! Renderers only ever see a [`ReportTable`].

use clap::ValueEnum;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::aggregate::{Grouping, LineItem, PartGroup, Resolution};
use crate::core::netlist::DocumentMetadata;

pub const QUANTITY_TITLE: &str = "Quantity";
pub const REFERENCES_TITLE: &str = "Reference(s)";

/// Catalog column linked by default when a datasheet directory is given
pub const DATASHEET_COLUMN: &str = "datasheet";

#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    #[error("Visible column {index} is out of range (the report has {width} columns)")]
    #[diagnostic(
        code(tbom::report::visible_column),
        help("Column indices start at 0; run `tbom columns <CATALOG>` to list them")
    )]
    VisibleColumnOutOfRange { index: usize, width: usize },

    #[error("Unknown report column `{name}`")]
    #[diagnostic(code(tbom::report::unknown_column), help("Available columns: {available}"))]
    UnknownColumn { name: String, available: String },
}

/// Where the quantity/references pair sits relative to the catalog columns
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// `Quantity, Reference(s), <catalog columns...>`
    #[default]
    Leading,
    /// `<catalog columns...>, Quantity, Reference(s)`
    Trailing,
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Leading => write!(f, "leading"),
            Layout::Trailing => write!(f, "trailing"),
        }
    }
}

impl Layout {
    /// Header index of catalog column `i`
    pub fn catalog_index(&self, i: usize) -> usize {
        match self {
            Layout::Leading => i + 2,
            Layout::Trailing => i,
        }
    }
}

/// Convert a catalog column name into a header title
///
/// Underscores become spaces; a letter is upper-cased when it starts a word
/// (previous character is not a letter) and lower-cased otherwise.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_is_letter = false;

    for ch in name.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }

    out
}

/// Build the header row for a catalog's columns
pub fn build_header(columns: &[String], layout: Layout) -> Vec<String> {
    let titled = columns.iter().map(|c| title_case(c));
    let pair = [QUANTITY_TITLE.to_string(), REFERENCES_TITLE.to_string()];

    match layout {
        Layout::Leading => pair.into_iter().chain(titled).collect(),
        Layout::Trailing => titled.chain(pair).collect(),
    }
}

/// Cells of one line item in header order
pub fn row_cells(item: &LineItem, layout: Layout) -> Vec<String> {
    let pair = [item.quantity.to_string(), item.references.clone()];
    let values = item.values.iter().cloned();

    match layout {
        Layout::Leading => pair.into_iter().chain(values).collect(),
        Layout::Trailing => values.chain(pair).collect(),
    }
}

/// Stable sort by the joined references string, compared byte-wise
///
/// `R10` sorts before `R2`; quantity and catalog values never affect order.
pub fn sort_rows(mut items: Vec<LineItem>) -> Vec<LineItem> {
    items.sort_by(|a, b| a.references.cmp(&b.references));
    items
}

/// Per-column visible/suppressed flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnVisibility(Vec<bool>);

impl ColumnVisibility {
    pub fn all(width: usize) -> Self {
        Self(vec![true; width])
    }

    /// Mark only `indices` visible
    pub fn from_indices(width: usize, indices: &[usize]) -> Result<Self, ReportError> {
        let mut mask = vec![false; width];
        for &index in indices {
            let slot = mask
                .get_mut(index)
                .ok_or(ReportError::VisibleColumnOutOfRange { index, width })?;
            *slot = true;
        }
        Ok(Self(mask))
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn visible_indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.then_some(i))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A column rendered as a hyperlink into the datasheet directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSpec {
    /// Column whose cells carry the link
    pub column: usize,
    /// Column whose value names the datasheet file
    pub target_column: usize,
    pub base: String,
}

impl LinkSpec {
    /// Link target for a row, if the row names a datasheet
    pub fn href(&self, row: &[String]) -> Option<String> {
        row.get(self.target_column)
            .filter(|v| !v.trim().is_empty())
            .map(|v| format!("{}/{}", self.base, v))
    }
}

/// Counts and anomalies of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_references: usize,
    pub line_items: usize,
    /// Designators without exactly one usable part id
    pub unresolved: Vec<String>,
    /// Groups whose part id matched no catalog row
    pub missing: Vec<PartGroup>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.missing.is_empty()
    }

    /// Designators left out of the table because their part id is unknown
    pub fn missing_references(&self) -> usize {
        self.missing.iter().map(PartGroup::quantity).sum()
    }
}

/// Assembly settings taken from the run configuration
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub layout: Layout,
    /// Visible header indices; `None` shows every column
    pub visible_columns: Option<Vec<usize>>,
    /// Column rendered as a link (catalog column name or header title);
    /// falls back to a `datasheet` catalog column
    pub link_column: Option<String>,
    /// Column holding the datasheet file name; defaults to `link_column`
    pub link_target_column: Option<String>,
    pub datasheet_dir: Option<String>,
}

/// The table handed to every renderer
#[derive(Debug, Clone, Serialize)]
pub struct ReportTable {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub visibility: ColumnVisibility,
    pub link: Option<LinkSpec>,
    pub metadata: DocumentMetadata,
    pub summary: RunSummary,
}

impl ReportTable {
    /// Assemble the final table from resolved line items
    pub fn assemble(
        columns: &[String],
        grouping: &Grouping,
        resolution: Resolution,
        metadata: DocumentMetadata,
        options: &ReportOptions,
    ) -> Result<Self, ReportError> {
        let header = build_header(columns, options.layout);
        let width = header.len();

        let visibility = match options.visible_columns {
            Some(ref indices) => ColumnVisibility::from_indices(width, indices)?,
            None => ColumnVisibility::all(width),
        };

        let link = match options.datasheet_dir {
            Some(ref base) => {
                let name = options.link_column.as_deref().or_else(|| {
                    columns
                        .iter()
                        .find(|c| c.eq_ignore_ascii_case(DATASHEET_COLUMN))
                        .map(String::as_str)
                });
                match name {
                    Some(name) => {
                        let column = find_column(name, columns, &header, options.layout)?;
                        let target_column = match options.link_target_column {
                            Some(ref target) => {
                                find_column(target, columns, &header, options.layout)?
                            }
                            None => column,
                        };
                        Some(LinkSpec {
                            column,
                            target_column,
                            base: base.clone(),
                        })
                    }
                    None => {
                        tracing::warn!(
                            datasheet_dir = %base,
                            "catalog has no `{}` column and no link column is set; datasheet directory unused",
                            DATASHEET_COLUMN
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let line_items = resolution.line_items.len();
        let rows: Vec<Vec<String>> = sort_rows(resolution.line_items)
            .iter()
            .map(|item| row_cells(item, options.layout))
            .collect();
        debug_assert!(rows.iter().all(|r| r.len() == width));

        let summary = RunSummary {
            total_references: grouping.reference_count(),
            line_items,
            unresolved: grouping.unresolved.clone(),
            missing: resolution.missing,
        };

        Ok(Self {
            title: report_title(&metadata),
            header,
            rows,
            visibility,
            link,
            metadata,
            summary,
        })
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Header cells that are not suppressed
    pub fn visible_header(&self) -> Vec<&str> {
        self.visibility
            .visible_indices()
            .into_iter()
            .filter_map(|i| self.header.get(i).map(String::as_str))
            .collect()
    }

    /// Row cells that are not suppressed
    pub fn visible_row<'a>(&self, row: &'a [String]) -> Vec<&'a str> {
        self.visibility
            .visible_indices()
            .into_iter()
            .filter_map(|i| row.get(i).map(String::as_str))
            .collect()
    }
}

/// Heading used by renderers, e.g. `Bill of Materials: Amp vB`
pub fn report_title(metadata: &DocumentMetadata) -> String {
    match (&metadata.title, &metadata.revision) {
        (Some(title), Some(rev)) => format!("Bill of Materials: {} v{}", title, rev),
        (Some(title), None) => format!("Bill of Materials: {}", title),
        _ => "Bill of Materials".to_string(),
    }
}

/// Resolve a column by catalog name or header title
fn find_column(
    name: &str,
    columns: &[String],
    header: &[String],
    layout: Layout,
) -> Result<usize, ReportError> {
    if let Some(i) = columns.iter().position(|c| c == name) {
        return Ok(layout.catalog_index(i));
    }
    header
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| ReportError::UnknownColumn {
            name: name.to_string(),
            available: columns.join(", "),
        })
}
