//! CLI command implementations

pub mod columns;
pub mod completions;
pub mod generate;
pub mod inspect;
