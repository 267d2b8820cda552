//! Storage traits and error types
//!
//! This module defines the trait interface for page stores and the
//! associated error type.

use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to prepare output directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A page that was written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    /// Where the page now lives
    pub path: PathBuf,

    /// Number of bytes written
    pub bytes: u64,
}

/// Trait for page store implementations
///
/// A store maps canonical URLs to local files and writes rendered markup.
/// Writes overwrite any existing file for the same URL.
pub trait PageStore: Send + Sync {
    /// Creates the output location if it does not exist
    fn prepare(&self) -> StorageResult<()>;

    /// Writes the rendered HTML of `url`
    ///
    /// # Returns
    ///
    /// The path written and the number of bytes, which always equals
    /// `html.len()` on success
    fn write_page(&self, url: &Url, html: &str) -> StorageResult<StoredPage>;

    /// The directory pages are written under
    fn root(&self) -> &Path;
}
