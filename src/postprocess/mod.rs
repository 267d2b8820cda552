//! Post-processing of mirrored pages
//!
//! Mirrored pages often defer their images behind `loading="lazy"` and
//! `data-src`/`data-srcset` attributes that only client-side scripts resolve.
//! This module provides:
//! - A rewrite of those `<img>` attributes to their eager equivalents
//! - A batch driver over an output directory
//! - A read-only verification pass that reports residual markers

mod batch;
mod lazy;
mod verify;

pub use batch::{html_files, rewrite_directory, BatchReport};
pub use lazy::{rewrite_file, rewrite_lazy_images, LazyImageRewriter, RewriteStats};
pub use verify::{verify_directory, FileVerdict, VerifyReport, LAZY_MARKERS};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while post-processing pages
#[derive(Debug, Error)]
pub enum PostprocessError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for post-processing operations
pub type PostprocessResult<T> = Result<T, PostprocessError>;
