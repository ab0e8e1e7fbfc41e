//! Runtime configuration loaded from TOML.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of concurrent clone/pull operations
pub const DEFAULT_SYNC_WORKERS: usize = 3;

/// Default number of sync-and-retry rounds before giving up on an item
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default vote count at which an image is reconciled
pub const DEFAULT_VOTE_THRESHOLD: f64 = 3.0;

/// Default lifetime of a finished upload status record
pub const DEFAULT_STATUS_TTL_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local working copy of the image repository
    pub download_dir: PathBuf,
    /// Remote URL of the image repository
    pub image_repo_url: String,
    /// Parent directory of the verification working copy
    pub validation_local_dir: PathBuf,
    /// Verification repository directory name under `validation_local_dir`
    pub validation_repo_dir: String,
    /// Remote URL of the verification repository
    pub validation_repo_url: String,
    pub redis_url: String,
    pub max_sync_workers: usize,
    pub max_retries: u32,
    pub vote_threshold: f64,
    pub status_ttl_secs: u64,
    /// Probability that a routine push progress event is logged
    pub progress_log_chance: f64,
    pub git_author_name: String,
    pub git_author_email: String,
    /// Word used for items in chat messages ("bird", "species", ...)
    pub id_type: String,
    /// category -> items in that category
    pub categories: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("github_download"),
            image_repo_url: String::new(),
            validation_local_dir: PathBuf::from("validation_download"),
            validation_repo_dir: "verify".to_string(),
            validation_repo_url: String::new(),
            redis_url: "redis://127.0.0.1/".to_string(),
            max_sync_workers: DEFAULT_SYNC_WORKERS,
            max_retries: DEFAULT_MAX_RETRIES,
            vote_threshold: DEFAULT_VOTE_THRESHOLD,
            status_ttl_secs: DEFAULT_STATUS_TTL_SECS,
            progress_log_chance: 0.25,
            git_author_name: "sciolyid".to_string(),
            git_author_email: "sciolyid@localhost".to_string(),
            id_type: "species".to_string(),
            categories: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.download_dir = expand_tilde(&config.download_dir);
        config.validation_local_dir = expand_tilde(&config.validation_local_dir);
        config.validate()?;
        Ok(config)
    }

    /// Default config path (~/.config/sciolyid/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sciolyid").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_sync_workers == 0 {
            return Err(Error::Config(
                "max_sync_workers must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.progress_log_chance) {
            return Err(Error::Config(format!(
                "progress_log_chance must be within [0, 1], got {}",
                self.progress_log_chance
            )));
        }
        if self.vote_threshold <= 0.0 {
            return Err(Error::Config(
                "vote_threshold must be positive".to_string(),
            ));
        }
        if self.validation_repo_dir.trim().is_empty() {
            return Err(Error::Config(
                "validation_repo_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Verification working copy root
    pub fn validation_root(&self) -> PathBuf {
        self.validation_local_dir.join(&self.validation_repo_dir)
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if path_str == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    } else if let Some(rest) = path_str.strip_prefix("~/") {
        match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        }
    } else {
        path.to_path_buf()
    }
}
