//! One BOM run: extract, group, resolve, assemble
//!
//! Everything a run needs travels in an immutable [`RunContext`]; each stage
//! hands its result to the next as a plain value.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::aggregate::{self, Grouping};
use crate::core::catalog::{CatalogError, CatalogLookup, PartCatalog};
use crate::core::config::BomConfig;
use crate::core::netlist::{Netlist, NetlistError};
use crate::core::report::{ReportError, ReportTable};

#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Netlist(#[from] NetlistError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Report(#[from] ReportError),
}

/// Paths and settings for a single invocation
#[derive(Debug, Clone)]
pub struct RunContext {
    pub input: PathBuf,
    pub output_base: PathBuf,
    pub catalog: PathBuf,
    pub datasheet_dir: Option<String>,
    pub config: BomConfig,
}

/// Parse the netlist and group its designators, without touching the catalog
pub fn extract(ctx: &RunContext) -> Result<(Netlist, Grouping), PipelineError> {
    let netlist = Netlist::load(&ctx.input, ctx.config.field())?;
    let grouping = aggregate::group(netlist.part_ids());
    Ok((netlist, grouping))
}

/// Build the report table for a run
pub fn build_report(ctx: &RunContext) -> Result<ReportTable, PipelineError> {
    let _span = tracing::info_span!("build_report", input = %ctx.input.display()).entered();

    let (netlist, grouping) = extract(ctx)?;

    let (columns, resolution) = {
        let catalog = PartCatalog::open(&ctx.catalog, ctx.config.table(), ctx.config.key_column())?;
        let resolution = aggregate::resolve(&grouping, &catalog)?;
        (catalog.columns().to_vec(), resolution)
    };

    let options = ctx.config.report_options(ctx.datasheet_dir.clone());
    let table = ReportTable::assemble(&columns, &grouping, resolution, netlist.metadata, &options)?;

    tracing::info!(
        references = table.summary.total_references,
        line_items = table.summary.line_items,
        unresolved = table.summary.unresolved.len(),
        missing = table.summary.missing.len(),
        "report assembled"
    );

    Ok(table)
}
