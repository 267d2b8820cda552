//! Markdown run report generation
//!
//! This module renders a finished crawl as a human-readable markdown file:
//! run information, totals, the failed pages and every persisted page.

use crate::output::types::{CrawlReport, OutputResult, PageOutcome};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report of a crawl run
///
/// # Arguments
///
/// * `report` - The finished crawl
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_report(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let summary = &report.summary;
    let mut md = String::new();

    md.push_str("# Docs-Mirror Crawl Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed_url));
    md.push_str(&format!(
        "- **Output Directory**: {}\n",
        summary.output_dir.display()
    ));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        summary.finished_at.to_rfc3339()
    ));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        summary.duration_seconds()
    ));
    match &report.aborted {
        Some(reason) => md.push_str(&format!("- **Status**: aborted ({})\n\n", reason)),
        None => md.push_str("- **Status**: completed\n\n"),
    }

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Pages Persisted**: {}\n",
        summary.pages_persisted
    ));
    md.push_str(&format!("- **Pages Failed**: {}\n", summary.pages_failed));
    md.push_str(&format!("- **Total Bytes**: {}\n", summary.total_bytes));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    // Failures
    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        md.push_str("## Failed Pages\n\n");
        md.push_str("| URL | Kind | Reason |\n");
        md.push_str("|-----|------|--------|\n");
        for record in failures {
            if let PageOutcome::Failed { kind, reason } = &record.outcome {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    escape_cell(&record.url),
                    kind,
                    escape_cell(reason)
                ));
            }
        }
        md.push('\n');
    }

    // Persisted pages
    let persisted: Vec<_> = report
        .records
        .iter()
        .filter(|r| r.outcome.is_success())
        .collect();
    if !persisted.is_empty() {
        md.push_str("## Persisted Pages\n\n");
        md.push_str("| URL | Title | File | Bytes |\n");
        md.push_str("|-----|-------|------|-------|\n");
        for record in persisted {
            let file = record
                .path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                escape_cell(&record.url),
                escape_cell(record.title.as_deref().unwrap_or("")),
                escape_cell(&file),
                record.bytes
            ));
        }
        md.push('\n');
    }

    md
}

/// Keeps a free-text value from breaking the table layout
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
