//! Verification of rewritten pages
//!
//! A textual cross-check of the structural rewrite: each file is searched
//! for the raw deferred-loading markers anywhere in its content.

use crate::postprocess::batch::html_files;
use crate::postprocess::PostprocessResult;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Markers that indicate a page still defers image loading
pub const LAZY_MARKERS: [&str; 3] = [r#"loading="lazy""#, r#"data-src=""#, r#"data-srcset=""#];

/// Verification result for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVerdict {
    pub path: PathBuf,

    /// First marker found, if any
    pub residual: Option<&'static str>,

    /// Set when the file could not be read
    pub error: Option<String>,
}

impl FileVerdict {
    pub fn is_clean(&self) -> bool {
        self.residual.is_none() && self.error.is_none()
    }
}

/// Verification result for a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub files: Vec<FileVerdict>,
}

impl VerifyReport {
    /// Number of HTML files checked, readable or not
    pub fn checked(&self) -> usize {
        self.files.len()
    }

    pub fn clean(&self) -> usize {
        self.files.iter().filter(|f| f.is_clean()).count()
    }

    pub fn dirty(&self) -> usize {
        self.checked() - self.clean()
    }

    pub fn is_clean(&self) -> bool {
        self.dirty() == 0
    }
}

/// Checks every HTML file in `dir` for residual deferred-loading markers
///
/// Files are read as lossy UTF-8 and never modified.
pub fn verify_directory(dir: &Path) -> PostprocessResult<VerifyReport> {
    let patterns = LAZY_MARKERS
        .iter()
        .map(|marker| Ok((*marker, Regex::new(&regex::escape(marker))?)))
        .collect::<PostprocessResult<Vec<(&'static str, Regex)>>>()?;

    let mut report = VerifyReport::default();

    for path in html_files(dir)? {
        let verdict = match std::fs::read(&path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                let residual = patterns
                    .iter()
                    .find(|(_, pattern)| pattern.is_match(&content))
                    .map(|(marker, _)| *marker);

                match residual {
                    Some(marker) => tracing::warn!(
                        "{} still contains {}",
                        path.display(),
                        marker
                    ),
                    None => tracing::debug!("{} is clean", path.display()),
                }

                FileVerdict {
                    path,
                    residual,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                FileVerdict {
                    path,
                    residual: None,
                    error: Some(e.to_string()),
                }
            }
        };
        report.files.push(verdict);
    }

    Ok(report)
}
