//! Run result types
//!
//! This module defines the per-page records produced by a crawl and the
//! summary derived from them.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Why a page ended in the failed state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Navigation or network quiescence exceeded the timeout
    Timeout,
    /// Navigation failed (DNS, connection, bad response)
    Network,
    /// The rendered page could not be written
    Persistence,
    /// The browser session died while this page was in flight
    SessionFatal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Persistence => "persistence",
            Self::SessionFatal => "session",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Persisted,
    Failed { kind: FailureKind, reason: String },
}

impl PageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// The result of one fetch attempt; written once, never mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Canonical URL that was fetched
    pub url: String,

    /// Local file the page was (or would have been) written to
    pub path: Option<PathBuf>,

    /// Bytes of rendered HTML; zero when rendering failed
    pub bytes: u64,

    /// Document title at capture time, if the page was rendered
    pub title: Option<String>,

    pub outcome: PageOutcome,
}

impl PageRecord {
    pub fn persisted(url: impl Into<String>, path: PathBuf, bytes: u64) -> Self {
        Self {
            url: url.into(),
            path: Some(path),
            bytes,
            title: None,
            outcome: PageOutcome::Persisted,
        }
    }

    pub fn failed(
        url: impl Into<String>,
        path: Option<PathBuf>,
        bytes: u64,
        kind: FailureKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            path,
            bytes,
            title: None,
            outcome: PageOutcome::Failed {
                kind,
                reason: reason.into(),
            },
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

/// Terminal statistics of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// Where the crawl started
    pub seed_url: String,

    /// Absolute path of the output directory
    pub output_dir: PathBuf,

    pub pages_persisted: u64,
    pub pages_failed: u64,

    /// Sum of bytes of all persisted pages
    pub total_bytes: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlSummary {
    /// Builds a summary from the page records of a run
    pub fn from_records(
        seed_url: impl Into<String>,
        output_dir: PathBuf,
        records: &[PageRecord],
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let (persisted, failed): (Vec<&PageRecord>, Vec<&PageRecord>) =
            records.iter().partition(|r| r.outcome.is_success());

        Self {
            seed_url: seed_url.into(),
            output_dir,
            pages_persisted: persisted.len() as u64,
            pages_failed: failed.len() as u64,
            total_bytes: persisted.iter().map(|r| r.bytes).sum(),
            started_at,
            finished_at,
        }
    }

    /// Total number of pages attempted
    pub fn pages_attempted(&self) -> u64 {
        self.pages_persisted + self.pages_failed
    }

    /// Wall-clock duration in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Percentage of attempted pages that were persisted
    pub fn success_rate(&self) -> f64 {
        if self.pages_attempted() == 0 {
            return 0.0;
        }
        (self.pages_persisted as f64 / self.pages_attempted() as f64) * 100.0
    }
}

/// Everything a crawl run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub summary: CrawlSummary,

    /// One record per fetched URL, in fetch order
    pub records: Vec<PageRecord>,

    /// Set when a session-fatal error ended the run early
    pub aborted: Option<String>,
}

impl CrawlReport {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }

    /// Records of failed pages
    pub fn failures(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter().filter(|r| !r.outcome.is_success())
    }
}
