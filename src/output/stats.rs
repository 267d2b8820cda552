//! Console summary of a crawl run

use crate::output::types::{CrawlReport, PageOutcome};

/// Prints the end-of-run summary to stdout
///
/// The two lines every run ends with are the number of pages persisted and
/// the absolute output directory.
pub fn print_summary(report: &CrawlReport) {
    let summary = &report.summary;

    println!("=== Crawl Summary ===\n");

    if let Some(reason) = &report.aborted {
        println!("Run aborted early: {}", reason);
        println!("Results below are partial.\n");
    }

    println!("Overview:");
    println!("  Seed: {}", summary.seed_url);
    println!("  Pages persisted: {}", summary.pages_persisted);
    println!("  Pages failed: {}", summary.pages_failed);
    println!("  Total bytes: {}", summary.total_bytes);
    println!("  Duration: {}s", summary.duration_seconds());
    println!();

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("Failed Pages ({}):", failures.len());
        for record in failures {
            if let PageOutcome::Failed { kind, reason } = &record.outcome {
                println!("  - [{}] {}: {}", kind, record.url, reason);
            }
        }
        println!();
    }

    println!(
        "Crawl finished: {} HTML files saved to {}",
        summary.pages_persisted,
        summary.output_dir.display()
    );
}
