//! tbom: Tessera BOM exporter
//!
//! Reads an EESchema intermediate netlist, groups designators by a custom
//! schematic field, joins each group against a local SQLite part catalog and
//! writes the result as CSV, HTML, Markdown or JSON.

pub mod cli;
pub mod core;
pub mod render;
