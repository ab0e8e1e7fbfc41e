//! Media acquisition and selection.
//!
//! ```text
//! request -> Fetcher -> RepoSync (clone/pull) -> MediaIndex (list)
//!         -> Selector (rotate, filter) -> prepare_attachment
//! ```

pub mod delivery;
pub mod fetcher;
pub mod index;
pub mod selector;
pub mod service;
pub mod sync;

pub use delivery::{prepare_attachment, Attachment};
pub use fetcher::Fetcher;
pub use index::MediaIndex;
pub use selector::Selector;
pub use service::MediaService;
pub use sync::{RepoSync, SyncAction};

use std::path::{Path, PathBuf};

/// Extensions that can be sent as images
pub const VALID_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "png", "jpeg", "gif"];

/// Files at or above this size are never delivered (4 MB)
pub const MAX_FILE_SIZE: u64 = 4_000_000;

/// A candidate media file with the metadata the filters need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub extension: String,
    pub size: u64,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        Self {
            path,
            extension,
            size,
        }
    }

    /// Stat `path` and build the entry. Blocks on the filesystem.
    pub fn stat(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::new(path, metadata.len()))
    }

    pub fn is_valid(&self) -> bool {
        is_valid_extension(&self.extension) && self.size < MAX_FILE_SIZE
    }
}

/// Extension as written in the file name, without the dot
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn is_valid_extension(extension: &str) -> bool {
    let lower = extension.to_ascii_lowercase();
    VALID_IMAGE_EXTENSIONS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        assert!(is_valid_extension("JPG"));
        assert!(is_valid_extension("jpeg"));
        assert!(is_valid_extension("Gif"));
        assert!(!is_valid_extension("mp3"));
        assert!(!is_valid_extension(""));
    }

    #[test]
    fn test_media_file_validity() {
        assert!(MediaFile::new("a/b/c.PNG", 1024).is_valid());
        assert!(MediaFile::new("a/b/c.jpg", MAX_FILE_SIZE - 1).is_valid());
        assert!(!MediaFile::new("a/b/c.jpg", MAX_FILE_SIZE).is_valid());
        assert!(!MediaFile::new("a/b/c.txt", 10).is_valid());
        assert!(!MediaFile::new("a/b.d/noext", 10).is_valid());
    }

    #[test]
    fn test_extension_keeps_case() {
        assert_eq!(extension_of(Path::new("x/y/photo.JPEG")), "JPEG");
        assert_eq!(extension_of(Path::new("x/y/photo")), "");
    }
}
