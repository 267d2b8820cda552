//! Batch rewrite over an output directory

use crate::postprocess::lazy::{LazyImageRewriter, RewriteStats};
use crate::postprocess::{PostprocessError, PostprocessResult};
use std::path::{Path, PathBuf};

/// Outcome of rewriting a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// HTML files found
    pub files_seen: usize,

    /// Files that had at least one image rewritten
    pub files_rewritten: usize,

    /// Files that could not be read or written
    pub files_failed: usize,

    /// Counters summed over all files
    pub stats: RewriteStats,
}

/// Lists the `.html` files directly inside `dir`, sorted by name
///
/// The extension match ignores case; subdirectories are not descended.
pub fn html_files(dir: &Path) -> PostprocessResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PostprocessError::NotADirectory(dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(dir).map_err(|source| PostprocessError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PostprocessError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        let is_html = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.to_ascii_lowercase().ends_with(".html"));

        if is_html && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Rewrites deferred images in every HTML file of `dir`, in place
///
/// A file that fails is logged and counted; the rest are still processed.
pub fn rewrite_directory(dir: &Path) -> PostprocessResult<BatchReport> {
    let rewriter = LazyImageRewriter::new()?;
    let files = html_files(dir)?;

    tracing::info!("Rewriting {} HTML files in {}", files.len(), dir.display());

    let mut report = BatchReport {
        files_seen: files.len(),
        ..BatchReport::default()
    };

    for path in &files {
        match rewriter.rewrite_file(path, None) {
            Ok(stats) => {
                if !stats.is_unchanged() {
                    report.files_rewritten += 1;
                }
                report.stats.merge(&stats);
            }
            Err(e) => {
                tracing::warn!("{}", e);
                report.files_failed += 1;
            }
        }
    }

    tracing::info!(
        "Batch rewrite finished: {} of {} files changed, {} failed",
        report.files_rewritten,
        report.files_seen,
        report.files_failed
    );

    Ok(report)
}
