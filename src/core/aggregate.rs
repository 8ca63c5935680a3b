//! Grouping of designators by part id and the catalog join
//!
//! Every designator ends up in exactly one place: a part group, or the
//! unresolved list. Groups whose id has no catalog row are returned as
//! misses next to the line items instead of disappearing.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::catalog::{CatalogError, CatalogLookup};

/// Separator between designators in the references column
pub const REFERENCE_DELIMITER: &str = ", ";

/// Designators sharing one external part id, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartGroup {
    pub part_id: String,
    pub references: Vec<String>,
}

impl PartGroup {
    pub fn quantity(&self) -> usize {
        self.references.len()
    }

    pub fn joined_references(&self) -> String {
        self.references.join(REFERENCE_DELIMITER)
    }
}

/// Result of grouping a netlist's `(designator, part id)` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    /// Groups in the order their part id was first seen
    pub groups: Vec<PartGroup>,
    /// Designators without a usable part id, in document order
    pub unresolved: Vec<String>,
}

impl Grouping {
    /// Designators accounted for across groups and the unresolved list
    pub fn reference_count(&self) -> usize {
        self.groups.iter().map(PartGroup::quantity).sum::<usize>() + self.unresolved.len()
    }

    pub fn get(&self, part_id: &str) -> Option<&PartGroup> {
        self.groups.iter().find(|g| g.part_id == part_id)
    }
}

/// One table row before header placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub part_id: String,
    pub quantity: usize,
    pub references: String,
    /// Catalog values in the catalog's column order
    pub values: Vec<String>,
}

/// Line items plus the groups the catalog knew nothing about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub line_items: Vec<LineItem>,
    pub missing: Vec<PartGroup>,
}

/// Group designators by part id
pub fn group<'a, I>(pairs: I) -> Grouping
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut grouping = Grouping::default();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for (reference, part_id) in pairs {
        match part_id {
            Some(id) => {
                let slot = *index.entry(id).or_insert_with(|| {
                    grouping.groups.push(PartGroup {
                        part_id: id.to_string(),
                        references: Vec::new(),
                    });
                    grouping.groups.len() - 1
                });
                grouping.groups[slot].references.push(reference.to_string());
            }
            None => grouping.unresolved.push(reference.to_string()),
        }
    }

    tracing::debug!(
        groups = grouping.groups.len(),
        unresolved = grouping.unresolved.len(),
        "grouped references"
    );

    grouping
}

/// Join every group against the catalog
///
/// Each matching record becomes its own line item. Any lookup error aborts
/// the whole resolution.
pub fn resolve<C>(grouping: &Grouping, catalog: &C) -> Result<Resolution, CatalogError>
where
    C: CatalogLookup + ?Sized,
{
    let width = catalog.columns().len();
    let mut resolution = Resolution::default();

    for group in &grouping.groups {
        let records = catalog.lookup(&group.part_id)?;

        if records.is_empty() {
            tracing::debug!(part_id = %group.part_id, references = %group.joined_references(), "part id not in catalog");
            resolution.missing.push(group.clone());
            continue;
        }

        let references = group.joined_references();
        for record in records {
            if record.values.len() != width {
                return Err(CatalogError::RecordWidth {
                    part_id: group.part_id.clone(),
                    expected: width,
                    found: record.values.len(),
                });
            }
            resolution.line_items.push(LineItem {
                part_id: group.part_id.clone(),
                quantity: group.quantity(),
                references: references.clone(),
                values: record.values,
            });
        }
    }

    tracing::debug!(
        line_items = resolution.line_items.len(),
        missing = resolution.missing.len(),
        "resolved part groups"
    );

    Ok(resolution)
}
