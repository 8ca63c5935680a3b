//! `tbom inspect` command - Show how a netlist groups, without a catalog

use console::style;
use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::GlobalOpts;
use crate::core::aggregate::{self, Grouping};
use crate::core::config::BomConfig;
use crate::core::netlist::Netlist;

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// Netlist XML exported from EESchema
    pub input: PathBuf,

    /// Schematic field holding the catalog key [default: internal_part]
    #[arg(long)]
    pub field: Option<String>,

    /// Config file (YAML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

pub fn run(args: InspectArgs, global: &GlobalOpts) -> Result<()> {
    let mut config = BomConfig::load(args.config.as_deref())?;
    config.merge(BomConfig {
        field: args.field,
        ..Default::default()
    });

    let netlist = Netlist::load(&args.input, config.field())?;
    let grouping = aggregate::group(netlist.part_ids());

    if global.quiet {
        for group in &grouping.groups {
            println!("{}\t{}", group.part_id, group.quantity());
        }
        return Ok(());
    }

    print!("{}", format_inspection(&netlist, &grouping, config.field()));
    Ok(())
}

fn format_inspection(netlist: &Netlist, grouping: &Grouping, field_name: &str) -> String {
    let mut output = String::new();
    let meta = &netlist.metadata;

    output.push_str(&format!(
        "{}\n",
        style(meta.title.as_deref().unwrap_or("(untitled)")).bold()
    ));
    if let Some(ref rev) = meta.revision {
        output.push_str(&format!("  Revision: {}\n", rev));
    }
    if let Some(ref date) = meta.date {
        output.push_str(&format!("  Date:     {}\n", date));
    }
    if let Some(ref source) = meta.source {
        output.push_str(&format!("  Source:   {}\n", source));
    }
    output.push_str(&format!(
        "  {} components, {} distinct {} values\n\n",
        style(netlist.len()).cyan(),
        style(grouping.groups.len()).cyan(),
        field_name
    ));

    if !grouping.groups.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Part", "Qty", "References"]);
        for group in &grouping.groups {
            builder.push_record([
                group.part_id.clone(),
                group.quantity().to_string(),
                truncate_str(&group.joined_references(), 60),
            ]);
        }
        output.push_str(&builder.build().with(Style::sharp()).to_string());
        output.push('\n');
    }

    if !grouping.unresolved.is_empty() {
        output.push_str(&format!(
            "\n{} {} reference(s) without {} field: {}\n",
            style("!").yellow(),
            grouping.unresolved.len(),
            field_name,
            grouping.unresolved.join(", ")
        ));
    }

    output
}
