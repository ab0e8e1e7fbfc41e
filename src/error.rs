use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Internal code for "no files for this item"
pub const NO_IMAGES_CODE: u16 = 100;

/// Internal code for "files exist but none pass the filters"
pub const NO_VALID_IMAGES_CODE: u16 = 999;

#[derive(Error, Debug)]
pub enum Error {
    /// Directory missing or empty. Recovered by the fetcher's retry loop.
    #[error("No Files")]
    Empty,

    #[error("No Images Found")]
    NoImages,

    #[error("No Valid Images Found")]
    NoValidImages,

    #[error("Repository sync failed: {0}")]
    Sync(String),

    /// Push produced no result entries
    #[error("Push returned no results")]
    PushFailure,

    #[error("Item is blank")]
    BlankItem,

    #[error("No category known for item '{0}'")]
    UnknownItem(String),

    #[error("File too large: {} ({} bytes)", .path.display(), .size)]
    FileTooLarge { path: PathBuf, size: u64 },

    #[error("Git error: {0}")]
    Git(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Job queue is closed")]
    QueueClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Numeric code used for internal branching and logging.
    pub fn code(&self) -> Option<u16> {
        match self {
            Error::Empty | Error::NoImages => Some(NO_IMAGES_CODE),
            Error::NoValidImages => Some(NO_VALID_IMAGES_CODE),
            _ => None,
        }
    }

    /// Plain-text message shown in chat. `id_type` names what items are
    /// ("bird", "species", ...).
    pub fn user_message(&self, id_type: &str) -> String {
        match self {
            Error::BlankItem => format!(
                "**There was an error fetching {}.**\n*Please try again.*",
                id_type
            ),
            Error::FileTooLarge { .. } => {
                "**Oops! File too large :(**\n*Please try again.*".to_string()
            }
            other => format!(
                "**An error has occurred while fetching images.**\n\
                 *Please try again.*\n**Reason:** {}",
                other
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
