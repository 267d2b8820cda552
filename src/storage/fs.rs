use crate::storage::path::local_path;
use crate::storage::traits::{PageStore, StorageError, StorageResult, StoredPage};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// Distinguishes temp files of concurrent writes within one process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Writes pages as flat files under a single directory
///
/// Each write goes to a short-named temporary file in the same directory
/// first and is renamed over the target, so a crash or a full disk never
/// leaves a truncated page behind. The temp name does not grow with the
/// page name, so any name the filesystem accepts can be written.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    suffix: String,
}

impl DirectoryStore {
    /// Creates a store rooted at `root`; file names get `suffix` appended
    /// when the URL path lacks it
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }

    /// Returns the path a URL will be written to
    pub fn path_for(&self, url: &Url) -> PathBuf {
        local_path(&self.root, url, &self.suffix)
    }
}

impl PageStore for DirectoryStore {
    fn prepare(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root).map_err(|source| StorageError::Prepare {
            path: self.root.clone(),
            source,
        })
    }

    fn write_page(&self, url: &Url, html: &str) -> StorageResult<StoredPage> {
        let path = self.path_for(url);
        let temp = temp_path(path.parent().unwrap_or(&self.root));

        let result = write_atomically(&temp, &path, html.as_bytes());
        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result.map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(StoredPage {
            path,
            bytes: html.len() as u64,
        })
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

fn temp_path(dir: &Path) -> PathBuf {
    dir.join(format!(
        ".docs-mirror.{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ))
}

fn write_atomically(temp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(temp_path, path)
}
