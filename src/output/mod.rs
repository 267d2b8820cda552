//! Output module for crawl results
//!
//! This module handles:
//! - Per-page records and the terminal run summary
//! - Printing the summary to the console
//! - Writing an optional markdown report

mod markdown;
mod stats;
mod types;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use stats::print_summary;
pub use types::{
    CrawlReport, CrawlSummary, FailureKind, OutputError, OutputResult, PageOutcome, PageRecord,
};
