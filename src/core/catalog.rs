//! SQLite part catalog
//!
//! The catalog is a single table keyed by the external part id. Its column
//! set is read from the database at open time and used verbatim, so adding a
//! column to the table adds a column to every report.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("Catalog not found: {}", path.display())]
    #[diagnostic(
        code(tbom::catalog::not_found),
        help("Pass the path of the SQLite parts database as the third argument")
    )]
    NotFound { path: PathBuf },

    #[error("Failed to open catalog {}", path.display())]
    #[diagnostic(code(tbom::catalog::open))]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Catalog has no table named `{0}`")]
    #[diagnostic(
        code(tbom::catalog::missing_table),
        help("Set the table name with --table or `table:` in the config file")
    )]
    MissingTable(String),

    #[error("Catalog table `{table}` has no key column `{column}`")]
    #[diagnostic(
        code(tbom::catalog::missing_key),
        help("Available columns: {available}")
    )]
    MissingKeyColumn {
        table: String,
        column: String,
        available: String,
    },

    #[error("Invalid SQL identifier: {0:?}")]
    #[diagnostic(code(tbom::catalog::identifier))]
    InvalidIdentifier(String),

    #[error("Catalog record for `{part_id}` has {found} values, expected {expected}")]
    #[diagnostic(code(tbom::catalog::record_width))]
    RecordWidth {
        part_id: String,
        expected: usize,
        found: usize,
    },

    #[error("Catalog query failed")]
    #[diagnostic(code(tbom::catalog::query))]
    Query(#[from] rusqlite::Error),
}

/// One catalog row, rendered to text in the table's column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRecord {
    pub values: Vec<String>,
}

impl CatalogRecord {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Key to rows lookup used to enrich part groups
pub trait CatalogLookup {
    /// Column names in the order every record lists its values
    fn columns(&self) -> &[String];

    /// All records whose key equals `part_id`; an empty list is a miss
    fn lookup(&self, part_id: &str) -> Result<Vec<CatalogRecord>, CatalogError>;
}

/// Read-only view of a parts table
pub struct PartCatalog {
    conn: Connection,
    table: String,
    key_column: String,
    columns: Vec<String>,
    lookup_sql: String,
}

impl PartCatalog {
    /// Open a catalog file read-only
    ///
    /// The connection is closed when the catalog is dropped.
    pub fn open(path: &Path, table: &str, key_column: &str) -> Result<Self, CatalogError> {
        if !path.is_file() {
            return Err(CatalogError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| CatalogError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(path = %path.display(), table, key_column, "opened catalog");
        Self::from_connection(conn, table, key_column)
    }

    /// Wrap an existing connection
    pub fn from_connection(
        conn: Connection,
        table: &str,
        key_column: &str,
    ) -> Result<Self, CatalogError> {
        let quoted_table = quote_identifier(table)?;
        let quoted_key = quote_identifier(key_column)?;

        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
            params![table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(CatalogError::MissingTable(table.to_string()));
        }

        let columns: Vec<String> = {
            let stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT 0", quoted_table))?;
            stmt.column_names().iter().map(|s| s.to_string()).collect()
        };

        // SQLite identifiers are case-insensitive for ASCII
        if !columns.iter().any(|c| c.eq_ignore_ascii_case(key_column)) {
            return Err(CatalogError::MissingKeyColumn {
                table: table.to_string(),
                column: key_column.to_string(),
                available: columns.join(", "),
            });
        }

        let lookup_sql = format!(
            "SELECT * FROM {} WHERE {} IS ?1",
            quoted_table, quoted_key
        );

        Ok(Self {
            conn,
            table: table.to_string(),
            key_column: key_column.to_string(),
            columns,
            lookup_sql,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Number of rows in the parts table
    pub fn row_count(&self) -> Result<usize, CatalogError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&self.table)?);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

impl CatalogLookup for PartCatalog {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn lookup(&self, part_id: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
        let mut stmt = self.conn.prepare(&self.lookup_sql)?;
        let width = stmt.column_count();

        let rows = stmt.query_map(params![part_id], |row| {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(render_value(row.get_ref(i)?));
            }
            Ok(CatalogRecord { values })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        tracing::trace!(part_id, matches = records.len(), "catalog lookup");
        Ok(records)
    }
}

/// Render a SQLite value the way it appears in a report cell
fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(_) => "<blob>".to_string(),
    }
}

/// Double-quote an identifier for interpolation into SQL
fn quote_identifier(name: &str) -> Result<String, CatalogError> {
    if name.trim().is_empty() || name.contains('\0') {
        return Err(CatalogError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}
