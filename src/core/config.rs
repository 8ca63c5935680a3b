//! Configuration management with layered hierarchy
//!
//! Sources are merged in priority order, later ones winning:
//! built-in defaults, the global user config, an explicit `--config` file,
//! `TBOM_*` environment variables and finally command-line flags.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::core::report::{Layout, ReportOptions};
use crate::render::ReportFormat;

pub const DEFAULT_FIELD: &str = "internal_part";
pub const DEFAULT_TABLE: &str = "parts";
pub const DEFAULT_KEY_COLUMN: &str = "internal_part";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {}", path.display())]
    #[diagnostic(code(tbom::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}", path.display())]
    #[diagnostic(
        code(tbom::config::parse),
        help("Valid keys: field, table, key_column, layout, visible_columns, link_column, link_target_column, formats, stylesheet")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

/// BOM export configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BomConfig {
    /// Custom schematic field holding the catalog key
    pub field: Option<String>,

    /// Catalog table name
    pub table: Option<String>,

    /// Catalog column matched against the field value
    pub key_column: Option<String>,

    /// Placement of the quantity/references columns
    pub layout: Option<Layout>,

    /// Header indices shown by renderers that can hide columns
    pub visible_columns: Option<Vec<usize>>,

    /// Column rendered as a datasheet link
    pub link_column: Option<String>,

    /// Column holding the datasheet file name
    pub link_target_column: Option<String>,

    /// Output formats to write
    pub formats: Option<Vec<ReportFormat>>,

    /// Write style.css next to HTML output
    pub stylesheet: Option<bool>,
}

impl BomConfig {
    /// Load configuration from all file and environment sources
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = BomConfig::default();

        // Global user config (~/.config/tbom/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.is_file() {
                tracing::debug!(path = %global_path.display(), "loading global config");
                config.merge(Self::from_file(&global_path)?);
            }
        }

        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "loading config");
            config.merge(Self::from_file(path)?);
        }

        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Parse a single YAML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents, path)
    }

    fn from_yaml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "tbom")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Apply `TBOM_FIELD`, `TBOM_TABLE` and `TBOM_KEY_COLUMN`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(field) = lookup("TBOM_FIELD") {
            self.field = Some(field);
        }
        if let Some(table) = lookup("TBOM_TABLE") {
            self.table = Some(table);
        }
        if let Some(key_column) = lookup("TBOM_KEY_COLUMN") {
            self.key_column = Some(key_column);
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: BomConfig) {
        if other.field.is_some() {
            self.field = other.field;
        }
        if other.table.is_some() {
            self.table = other.table;
        }
        if other.key_column.is_some() {
            self.key_column = other.key_column;
        }
        if other.layout.is_some() {
            self.layout = other.layout;
        }
        if other.visible_columns.is_some() {
            self.visible_columns = other.visible_columns;
        }
        if other.link_column.is_some() {
            self.link_column = other.link_column;
        }
        if other.link_target_column.is_some() {
            self.link_target_column = other.link_target_column;
        }
        if other.formats.is_some() {
            self.formats = other.formats;
        }
        if other.stylesheet.is_some() {
            self.stylesheet = other.stylesheet;
        }
    }

    pub fn field(&self) -> &str {
        self.field.as_deref().unwrap_or(DEFAULT_FIELD)
    }

    pub fn table(&self) -> &str {
        self.table.as_deref().unwrap_or(DEFAULT_TABLE)
    }

    pub fn key_column(&self) -> &str {
        self.key_column.as_deref().unwrap_or(DEFAULT_KEY_COLUMN)
    }

    pub fn layout(&self) -> Layout {
        self.layout.unwrap_or_default()
    }

    /// Formats to write, CSV and HTML unless configured
    pub fn formats(&self) -> Vec<ReportFormat> {
        match self.formats {
            Some(ref formats) if !formats.is_empty() => formats.clone(),
            _ => vec![ReportFormat::Csv, ReportFormat::Html],
        }
    }

    pub fn stylesheet(&self) -> bool {
        self.stylesheet.unwrap_or(true)
    }

    /// Options for the report assembler
    pub fn report_options(&self, datasheet_dir: Option<String>) -> ReportOptions {
        ReportOptions {
            layout: self.layout(),
            visible_columns: self.visible_columns.clone(),
            link_column: self.link_column.clone(),
            link_target_column: self.link_target_column.clone(),
            datasheet_dir,
        }
    }
}
