//! Colored CLI output for sync reports and status.

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::knowledge::{SyncReport, VersionManifest};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// One line summarising a sync report, without colors.
#[must_use]
pub fn summarize_sync(report: &SyncReport) -> String {
    if report.success {
        "Sync completed successfully".to_string()
    } else {
        format!(
            "Sync completed with {} failed required file(s): {}",
            report.failed_files.len(),
            report.failed_files.join(", ")
        )
    }
}

/// Print the outcome of a sync.
pub fn print_sync_report(report: &SyncReport, base_path: &Path) {
    let ts = timestamp();
    let tag = if report.success {
        "[SYNC]".green().bold().to_string()
    } else {
        "[SYNC]".red().bold().to_string()
    };
    println!(
        "{} {} {} {}",
        ts.dimmed(),
        tag,
        summarize_sync(report),
        format!("path={}", base_path.display()).dimmed()
    );
    for file in &report.failed_files {
        println!("{} {} {}", ts.dimmed(), "[FAILED]".red().bold(), file);
    }
    let _ = io::stdout().flush();
}

/// Print the manifest of the most recent sync.
pub fn print_manifest(manifest: &VersionManifest) {
    println!(
        "{} latest={} versions={} updated={}",
        "[STATUS]".blue().bold(),
        manifest.latest_version.cyan(),
        manifest.versions.join(","),
        manifest.last_updated.to_rfc3339().dimmed()
    );
    for (path, ok) in &manifest.sync_results {
        if *ok {
            println!("  {} {}", "ok".green(), path);
        } else {
            println!("  {} {}", "failed".red(), path);
        }
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_success() {
        let report = SyncReport {
            success: true,
            failed_files: Vec::new(),
        };
        assert_eq!(summarize_sync(&report), "Sync completed successfully");
    }

    #[test]
    fn test_summarize_failure_lists_files() {
        let report = SyncReport {
            success: false,
            failed_files: vec![
                "documentation/usage-guide.md".to_string(),
                "specifications/v1/schema.json".to_string(),
            ],
        };
        let summary = summarize_sync(&report);
        assert!(summary.contains("2 failed"));
        assert!(summary.contains("documentation/usage-guide.md, specifications/v1/schema.json"));
    }
}
