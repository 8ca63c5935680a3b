//! `tbom columns` command - Show a catalog's columns and header indices
//!
//! Header indices are what `--visible-columns` expects, so this is the way to
//! find them for a given catalog and layout.

use console::style;
use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::GlobalOpts;
use crate::core::catalog::{CatalogLookup, PartCatalog};
use crate::core::config::BomConfig;
use crate::core::report::{build_header, Layout};

#[derive(clap::Args, Debug)]
pub struct ColumnsArgs {
    /// SQLite part catalog
    pub catalog: PathBuf,

    /// Catalog table [default: parts]
    #[arg(long)]
    pub table: Option<String>,

    /// Catalog key column [default: internal_part]
    #[arg(long)]
    pub key_column: Option<String>,

    /// Header layout used to number the columns
    #[arg(long, value_enum)]
    pub layout: Option<Layout>,

    /// Config file (YAML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

pub fn run(args: ColumnsArgs, global: &GlobalOpts) -> Result<()> {
    let mut config = BomConfig::load(args.config.as_deref())?;
    config.merge(BomConfig {
        table: args.table,
        key_column: args.key_column,
        layout: args.layout,
        ..Default::default()
    });

    let catalog = PartCatalog::open(&args.catalog, config.table(), config.key_column())?;
    let header = build_header(catalog.columns(), config.layout());

    if global.quiet {
        for (i, title) in header.iter().enumerate() {
            println!("{}\t{}", i, title);
        }
        return Ok(());
    }

    println!(
        "{} table {} ({} rows, key {})",
        style("→").blue(),
        style(catalog.table()).bold(),
        style(catalog.row_count()?).cyan(),
        catalog.key_column()
    );
    println!();
    print!("{}", format_columns(catalog.columns(), &header, config.layout()));
    Ok(())
}

/// Table of header index, title and source column
fn format_columns(columns: &[String], header: &[String], layout: Layout) -> String {
    let mut builder = Builder::default();
    builder.push_record(["#", "Header", "Column"]);
    let offset = layout.catalog_index(0);
    for (i, title) in header.iter().enumerate() {
        let source = i
            .checked_sub(offset)
            .and_then(|c| columns.get(c))
            .map(String::as_str)
            .unwrap_or("-");
        builder.push_record([i.to_string(), title.clone(), source.to_string()]);
    }
    let mut output = builder.build().with(Style::sharp()).to_string();
    output.push('\n');
    output
}
