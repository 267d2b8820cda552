//! Storage module for persisting rendered pages
//!
//! This module handles:
//! - Mapping canonical URLs to flat local file names
//! - Creating the output directory
//! - Writing rendered markup atomically

mod fs;
mod path;
mod traits;

pub use fs::DirectoryStore;
pub use path::{local_file_name, local_path, FLAT_DELIMITER};
pub use traits::{PageStore, StorageError, StorageResult, StoredPage};
