//! CLI output formatting for the `generate` and `check` commands.
//!
//! Output is **section-centric**: the primary display is the report's
//! sections in the order they appear, each with a positional index. A
//! section whose table was replaced by an error row shows the message on an
//! indented line beneath it, so a successful run that still lost a table is
//! visible at a glance.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! Release Notes
//! 001 Executive Summary
//! 002 Access
//! 003 Details
//! 004 Included Requirements
//!     Table could not be created. Not enough data was pulled in: no rows.
//! 005 Test Cases
//!
//! Generated Orders Sprint 14 Release Notes.xlsx (18 KB, 1 table replaced)
//!     Output: out/Orders Sprint 14 Release Notes.xlsx
//! ```
//!
//! ## Check
//!
//! ```text
//! Settings
//!     Project: Orders
//!     Iteration: Sprint 14
//!     Title: APPLICATION BUILD/RELEASE NOTES
//!     Format: xlsx
//!
//! Data
//!     Summary facts: defaults + 1 from data
//!     Detail facts: defaults
//!     Included Requirements: 3 records, 5 columns
//!     Test Cases: absent
//!     Build #: 2026.3.14.2
//!     Changeset: Unavailable
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::backend::FIRST_SURFACE_NAME;
use crate::config::{OutputFormat, ReportSettings};
use crate::pipeline::{Report, SectionStatus};
use crate::source::{DataInventory, TableShape, UNAVAILABLE};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte size: bytes below 1 KB, whole KB below 1 MB.
fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{} KB", bytes / 1024)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn table_line(shape: Option<TableShape>) -> String {
    match shape {
        Some(s) => format!(
            "{}, {}",
            plural(s.rows, "record", "records"),
            plural(s.columns, "column", "columns")
        ),
        None => "absent".to_string(),
    }
}

// ============================================================================
// Generate
// ============================================================================

/// Format the result of a generate run.
pub fn format_generate_output(report: &Report, written_to: &Path) -> Vec<String> {
    let mut lines = vec![FIRST_SURFACE_NAME.to_string()];

    for (idx, section) in report.sections.iter().enumerate() {
        lines.push(format!("{} {}", format_index(idx + 1), section.name));
        if let SectionStatus::Substituted(message) = &section.status {
            lines.push(format!("    {}", message));
        }
    }

    let replaced = report.substitutions().count();
    let mut summary = format!(
        "Generated {} ({}",
        report.artifact.file_name,
        format_size(report.artifact.bytes.len())
    );
    if replaced > 0 {
        summary.push_str(&format!(", {} replaced", plural(replaced, "table", "tables")));
    }
    summary.push(')');

    lines.push(String::new());
    lines.push(summary);
    lines.push(format!("    Output: {}", written_to.display()));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(report: &Report, written_to: &Path) {
    for line in format_generate_output(report, written_to) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the result of validating settings and a data file.
pub fn format_check_output(
    settings: &ReportSettings,
    format: OutputFormat,
    inventory: &DataInventory,
) -> Vec<String> {
    let mut lines = vec![
        "Settings".to_string(),
        format!("    Project: {}", settings.project_name),
        format!("    Iteration: {}", settings.iteration),
        format!("    Title: {}", settings.title_text()),
        format!("    Format: {}", format.extension()),
    ];
    if let Some(location) = &settings.web_location {
        lines.push(format!("    Web Location: {}", location));
    }

    lines.push(String::new());
    lines.push("Data".to_string());
    lines.push(match inventory.summary_facts {
        0 => "    Summary facts: defaults".to_string(),
        n => format!("    Summary facts: defaults + {} from data", n),
    });
    lines.push(match inventory.detail_facts {
        0 => "    Detail facts: defaults".to_string(),
        n => format!("    Detail facts: defaults + {} from data", n),
    });
    lines.push(format!(
        "    Included Requirements: {}",
        table_line(inventory.records)
    ));
    lines.push(format!("    Test Cases: {}", table_line(inventory.test_cases)));
    lines.push(format!(
        "    Build #: {}",
        inventory.build_number.as_deref().unwrap_or(UNAVAILABLE)
    ));
    lines.push(format!(
        "    Changeset: {}",
        inventory
            .change_number
            .map_or_else(|| UNAVAILABLE.to_string(), |n| n.to_string())
    ));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(
    settings: &ReportSettings,
    format: OutputFormat,
    inventory: &DataInventory,
) {
    for line in format_check_output(settings, format, inventory) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Artifact;
    use crate::pipeline::SectionOutcome;
    use crate::test_helpers::sample_settings;

    fn report(sections: Vec<SectionOutcome>, size: usize) -> Report {
        Report {
            artifact: Artifact {
                bytes: vec![0; size],
                file_name: "Orders Sprint 14 Release Notes.xlsx".into(),
                mime_type: OutputFormat::Xlsx.mime_type(),
            },
            sections,
        }
    }

    fn section(name: &str, status: SectionStatus) -> SectionOutcome {
        SectionOutcome {
            name: name.into(),
            status,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(4), "004");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(18 * 1024 + 10), "18 KB");
        assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.5 MB");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "table", "tables"), "1 table");
        assert_eq!(plural(2, "table", "tables"), "2 tables");
    }

    // =========================================================================
    // Generate
    // =========================================================================

    #[test]
    fn generate_lists_sections_in_order() {
        let r = report(
            vec![
                section("Executive Summary", SectionStatus::Rendered),
                section("Access", SectionStatus::Rendered),
            ],
            100,
        );
        let lines = format_generate_output(&r, Path::new("out/x.xlsx"));
        assert_eq!(lines[0], "Release Notes");
        assert_eq!(lines[1], "001 Executive Summary");
        assert_eq!(lines[2], "002 Access");
        assert_eq!(lines[4], "Generated Orders Sprint 14 Release Notes.xlsx (100 B)");
        assert_eq!(lines[5], "    Output: out/x.xlsx");
    }

    #[test]
    fn generate_shows_replaced_tables() {
        let r = report(
            vec![section(
                "Included Requirements",
                SectionStatus::Substituted("Table could not be created. no rows".into()),
            )],
            2048,
        );
        let lines = format_generate_output(&r, Path::new("x.xlsx"));
        assert_eq!(lines[1], "001 Included Requirements");
        assert_eq!(lines[2], "    Table could not be created. no rows");
        assert!(lines[4].ends_with("(2 KB, 1 table replaced)"));
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_reports_settings_and_data() {
        let inventory = DataInventory {
            summary_facts: 1,
            detail_facts: 0,
            records: Some(TableShape {
                rows: 3,
                columns: 5,
            }),
            test_cases: None,
            build_number: None,
            change_number: Some(4711),
        };
        let lines = format_check_output(&sample_settings(), OutputFormat::Docx, &inventory);
        assert!(lines.contains(&"    Project: Orders".to_string()));
        assert!(lines.contains(&"    Format: docx".to_string()));
        assert!(lines.contains(&"    Summary facts: defaults + 1 from data".to_string()));
        assert!(lines.contains(&"    Detail facts: defaults".to_string()));
        assert!(lines.contains(&"    Included Requirements: 3 records, 5 columns".to_string()));
        assert!(lines.contains(&"    Test Cases: absent".to_string()));
        assert!(lines.contains(&"    Build #: Unavailable".to_string()));
        assert!(lines.contains(&"    Changeset: 4711".to_string()));
    }
}
