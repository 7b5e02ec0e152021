//! Flat on-disk store of downloaded documents.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Directory of documents keyed by sanitized filename.
///
/// The directory is created on the first write. Writes go to a temporary file
/// in the same directory which is then renamed over the target, so readers
/// never observe a partially written document.
///
/// Other processes writing the same name are not arbitrated: the last
/// writer wins.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Create a store rooted at `root`; nothing is touched on disk yet
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a sanitized name maps to
    pub fn path_for(&self, sanitized_name: &str) -> PathBuf {
        self.root.join(sanitized_name)
    }

    /// Whether a regular file is stored under this name
    pub async fn contains(&self, sanitized_name: &str) -> bool {
        tokio::fs::metadata(self.path_for(sanitized_name))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// Atomically write `bytes` under `sanitized_name`, replacing any
    /// existing document of that name.
    pub async fn write(&self, sanitized_name: &str, bytes: Vec<u8>) -> io::Result<PathBuf> {
        let root = self.root.clone();
        let target = self.path_for(sanitized_name);

        tokio::task::spawn_blocking(move || -> io::Result<PathBuf> {
            std::fs::create_dir_all(&root)?;

            let mut staged = tempfile::NamedTempFile::new_in(&root)?;
            staged.write_all(&bytes)?;
            staged.as_file().sync_all()?;
            staged.persist(&target).map_err(|e| e.error)?;

            Ok(target)
        })
        .await
        .map_err(io::Error::other)?
    }

    /// Read a stored document
    pub async fn read(&self, sanitized_name: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path_for(sanitized_name)).await
    }
}
