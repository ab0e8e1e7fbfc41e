//! Final checks before a file is handed to the chat layer.

use super::MAX_FILE_SIZE;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A file ready to upload, renamed so the file name does not give the answer away
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub filename: String,
    pub size: u64,
}

/// Re-check the size (the file may have changed since selection) and build the attachment.
pub async fn prepare_attachment(path: &Path, extension: &str) -> Result<Attachment> {
    let size = tokio::fs::metadata(path).await?.len();
    if size >= MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            path: path.to_path_buf(),
            size,
        });
    }
    Ok(Attachment {
        path: path.to_path_buf(),
        filename: format!("image.{}", extension),
        size,
    })
}
