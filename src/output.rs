//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Sync progress
//!
//! ```text
//! [processing: views/faq]
//!     [ADD]: Getting started
//!     [CHG]: Billing
//!     [DEL]: Old page
//!     Wrote faq.json (7 pages)
//! [processing: views/news]
//!     Pages are up to date!
//! ```
//!
//! ## Summary
//!
//! ```text
//! 2 directories: 1 added, 1 changed, 1 deleted, 11 unchanged
//! 1 bundle written
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::diff::ChangeKind;
use crate::sync::{SyncEvent, SyncReport};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    match (n, word) {
        (1, _) => format!("{n} {word}"),
        (_, "directory") => format!("{n} directories"),
        _ => format!("{n} {word}s"),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Sync progress
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_sync_event(event: &SyncEvent) -> Vec<String> {
    match event {
        SyncEvent::DirectoryStarted { directory } => vec![format!("[processing: {directory}]")],
        SyncEvent::PageChanged { title, kind, .. } => {
            vec![format!("{}[{}]: {}", indent(1), kind.tag(), title)]
        }
        SyncEvent::BundleWritten { path, pages, .. } => vec![format!(
            "{}Wrote {} ({})",
            indent(1),
            file_name(path),
            plural(*pages, "page")
        )],
        SyncEvent::UpToDate { .. } => vec![format!("{}Pages are up to date!", indent(1))],
        SyncEvent::DirectoryFailed { directory, error } => vec![
            format!("[skipped: {directory}]"),
            format!("{}{}", indent(1), error),
        ],
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Format the end-of-run summary.
///
/// `check` switches the wording to what a sync *would* do.
pub fn format_report(report: &SyncReport, check: bool) -> Vec<String> {
    let mut lines = Vec::new();

    let unchanged: usize = report.directories.iter().map(|d| d.unchanged).sum();
    lines.push(format!(
        "{}: {} added, {} changed, {} deleted, {} unchanged",
        plural(report.directories.len(), "directory"),
        report.total(ChangeKind::Added),
        report.total(ChangeKind::Changed),
        report.total(ChangeKind::Deleted),
        unchanged,
    ));

    if check {
        let stale: Vec<&str> = report
            .directories
            .iter()
            .filter(|d| !d.is_up_to_date())
            .map(|d| d.name.as_str())
            .collect();
        if stale.is_empty() {
            lines.push("All bundles are up to date".to_string());
        } else {
            lines.push(format!("{} out of date:", plural(stale.len(), "bundle")));
            for name in stale {
                lines.push(format!("{}{}", indent(1), name));
            }
        }
    } else {
        lines.push(format!("{} written", plural(report.bundles_written(), "bundle")));
    }

    if !report.failures.is_empty() {
        lines.push(format!("{} skipped:", plural(report.failures.len(), "directory")));
        for failure in &report.failures {
            lines.push(format!("{}{}: {}", indent(1), failure.name, failure.error));
        }
    }

    lines
}

pub fn print_sync_event(event: &SyncEvent) {
    for line in format_sync_event(event) {
        println!("{line}");
    }
}

pub fn print_report(report: &SyncReport, check: bool) {
    for line in format_report(report, check) {
        println!("{line}");
    }
}
