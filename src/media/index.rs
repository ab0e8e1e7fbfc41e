//! Listing of cached media files under `<root>/<category>/<item>/`.

use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MediaIndex {
    root: PathBuf,
}

impl MediaIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn item_dir(&self, category: &str, item: &str) -> PathBuf {
        self.root.join(category).join(item)
    }

    /// Paths of every entry in the item directory, sorted by name.
    ///
    /// A missing directory and an empty one both return [`Error::Empty`].
    pub async fn list_files(&self, category: &str, item: &str) -> Result<Vec<PathBuf>> {
        let dir = self.item_dir(category, item);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::Empty),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            files.push(entry.path());
        }

        if files.is_empty() {
            return Err(Error::Empty);
        }

        // Directory order is unspecified; rotation indices need a stable order
        files.sort();
        tracing::debug!("{} files in {}", files.len(), dir.display());
        Ok(files)
    }
}
