//! Core module - netlist extraction, catalog join and report assembly

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod netlist;
pub mod pipeline;
pub mod report;

pub use aggregate::{Grouping, LineItem, PartGroup, Resolution};
pub use catalog::{CatalogError, CatalogLookup, CatalogRecord, PartCatalog};
pub use config::{BomConfig, ConfigError};
pub use netlist::{ComponentEntry, DocumentMetadata, Netlist, NetlistError};
pub use pipeline::{PipelineError, RunContext};
pub use report::{Layout, ReportError, ReportOptions, ReportTable, RunSummary};
