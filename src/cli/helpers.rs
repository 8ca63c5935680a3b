//! Shared helper functions for CLI commands

use console::style;

use crate::core::report::RunSummary;

/// Truncate a string to max_len, adding "..." if truncated
///
/// Counts characters, so multi-byte designators never split.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print the run summary shown after a BOM export
pub fn print_summary(summary: &RunSummary, field_name: &str) {
    println!("  Line items:      {}", style(summary.line_items).cyan());
    println!("  Part references: {}", style(summary.total_references).cyan());
    print_anomalies(summary, field_name);
}

/// Print designators that did not make it into the table
///
/// Shown even with `--quiet`; CSV output has no place to carry them.
pub fn print_anomalies(summary: &RunSummary, field_name: &str) {
    for line in anomaly_lines(summary, field_name) {
        println!("{} {}", style("!").yellow(), line);
    }
}

fn anomaly_lines(summary: &RunSummary, field_name: &str) -> Vec<String> {
    let mut lines = Vec::new();

    if !summary.unresolved.is_empty() {
        lines.push(format!(
            "{} reference(s) without {} field: {}",
            summary.unresolved.len(),
            field_name,
            summary.unresolved.join(", ")
        ));
    }

    for group in &summary.missing {
        lines.push(format!(
            "{} not in catalog: {}",
            style(&group.part_id).bold(),
            group.joined_references()
        ));
    }

    lines
}
