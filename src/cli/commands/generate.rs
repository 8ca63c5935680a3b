//! `tbom generate` command - Export a BOM
//!
//! Designed to be called from EESchema's BOM plugin dialog:
//!
//! ```text
//! tbom generate "%I" "%O" /path/to/parts.sqlite /path/to/datasheets
//! ```

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{print_anomalies, print_summary};
use crate::cli::GlobalOpts;
use crate::core::config::BomConfig;
use crate::core::pipeline::{self, RunContext};
use crate::core::report::Layout;
use crate::render::{self, RenderOptions, ReportFormat};

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Netlist XML exported from EESchema
    pub input: PathBuf,

    /// Output base path; extensions are appended per format
    pub output: PathBuf,

    /// SQLite part catalog
    pub catalog: PathBuf,

    /// Datasheet directory for HTML links; the `datasheet` column is linked
    /// unless --link-column names another
    pub datasheet_dir: Option<String>,

    /// Output formats (comma-separated)
    #[arg(long, short = 'f', value_delimiter = ',')]
    pub format: Option<Vec<ReportFormat>>,

    /// Schematic field holding the catalog key [default: internal_part]
    #[arg(long)]
    pub field: Option<String>,

    /// Catalog table [default: parts]
    #[arg(long)]
    pub table: Option<String>,

    /// Catalog key column [default: internal_part]
    #[arg(long)]
    pub key_column: Option<String>,

    /// Where the quantity and reference columns go
    #[arg(long, value_enum)]
    pub layout: Option<Layout>,

    /// Header indices to show in HTML/Markdown output (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub visible_columns: Option<Vec<usize>>,

    /// Column rendered as a datasheet link
    #[arg(long)]
    pub link_column: Option<String>,

    /// Column holding the datasheet file name (defaults to --link-column)
    #[arg(long)]
    pub link_target_column: Option<String>,

    /// Do not write style.css next to the HTML file
    #[arg(long)]
    pub no_stylesheet: bool,

    /// Fail if any reference is unresolved or missing from the catalog
    #[arg(long)]
    pub strict: bool,

    /// Config file (YAML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl GenerateArgs {
    /// Settings given on the command line, merged last
    fn overrides(&self) -> BomConfig {
        BomConfig {
            field: self.field.clone(),
            table: self.table.clone(),
            key_column: self.key_column.clone(),
            layout: self.layout,
            visible_columns: self.visible_columns.clone(),
            link_column: self.link_column.clone(),
            link_target_column: self.link_target_column.clone(),
            formats: self.format.clone(),
            stylesheet: self.no_stylesheet.then_some(false),
        }
    }
}

pub fn run(args: GenerateArgs, global: &GlobalOpts) -> Result<()> {
    let mut config = BomConfig::load(args.config.as_deref())?;
    config.merge(args.overrides());

    let ctx = RunContext {
        input: args.input,
        output_base: args.output,
        catalog: args.catalog,
        datasheet_dir: args.datasheet_dir,
        config,
    };

    if !global.quiet {
        println!(
            "{} Building BOM from {}",
            style("→").blue(),
            ctx.input.display()
        );
    }

    let table = pipeline::build_report(&ctx)?;

    let options = RenderOptions {
        formats: ctx.config.formats(),
        stylesheet: ctx.config.stylesheet(),
        field_name: ctx.config.field().to_string(),
    };
    let written = render::write_all(&table, &ctx.output_base, &options)?;

    if global.quiet {
        print_anomalies(&table.summary, ctx.config.field());
    } else {
        print_summary(&table.summary, ctx.config.field());
        for path in &written {
            println!("{} BOM written to {}", style("✓").green(), path.display());
        }
    }

    if args.strict && !table.summary.is_clean() {
        return Err(miette::miette!(
            code = "tbom::generate::strict",
            help = "Add the missing parts to the catalog or set the field on every symbol",
            "{} reference(s) unresolved, {} part id(s) not in catalog",
            table.summary.unresolved.len(),
            table.summary.missing.len()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn parse(args: &[&str]) -> GenerateArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Generate(args) => args,
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_positional_arguments() {
        let args = parse(&["tbom", "generate", "amp.xml", "out/amp", "parts.sqlite", "sheets"]);
        assert_eq!(args.input, PathBuf::from("amp.xml"));
        assert_eq!(args.output, PathBuf::from("out/amp"));
        assert_eq!(args.catalog, PathBuf::from("parts.sqlite"));
        assert_eq!(args.datasheet_dir.as_deref(), Some("sheets"));
    }

    #[test]
    fn test_overrides_from_flags() {
        let args = parse(&[
            "tbom",
            "generate",
            "amp.xml",
            "amp",
            "parts.sqlite",
            "--format",
            "csv,md",
            "--layout",
            "trailing",
            "--visible-columns",
            "0,1,4",
            "--no-stylesheet",
        ]);
        let overrides = args.overrides();
        assert_eq!(overrides.formats, Some(vec![ReportFormat::Csv, ReportFormat::Md]));
        assert_eq!(overrides.layout, Some(Layout::Trailing));
        assert_eq!(overrides.visible_columns, Some(vec![0, 1, 4]));
        assert_eq!(overrides.stylesheet, Some(false));
        assert_eq!(overrides.field, None);
    }

    #[test]
    fn test_stylesheet_not_overridden_by_default() {
        let args = parse(&["tbom", "generate", "amp.xml", "amp", "parts.sqlite"]);
        assert_eq!(args.overrides().stylesheet, None);
    }
}
