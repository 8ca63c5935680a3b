//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand};

use crate::cli::commands::{
    columns::ColumnsArgs, completions::CompletionsArgs, generate::GenerateArgs,
    inspect::InspectArgs,
};

#[derive(Parser)]
#[command(name = "tbom")]
#[command(author, version, about = "Tessera BOM exporter")]
#[command(long_about = "Join a schematic netlist against a local SQLite part catalog and export bills of materials.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate BOM files from a netlist and a part catalog
    Generate(GenerateArgs),

    /// Show what a netlist contains, without a catalog
    Inspect(InspectArgs),

    /// List a catalog's columns and the report header they produce
    Columns(ColumnsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
