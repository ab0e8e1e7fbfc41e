//! Version control operations on the media repositories.
//!
//! Clone, pull, commit and push are treated as opaque blocking operations
//! behind [`GitBackend`]. Callers run them on the blocking pool.

pub mod cli;
pub mod flags;
pub mod porcelain;

pub use cli::GitCli;
pub use flags::{decode_opcodes, decode_push_flags, OpCodes, PushFlags};

use crate::error::Result;
use std::path::Path;

/// Result entry for one ref touched by a push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushInfo {
    pub flags: PushFlags,
    /// Local ref, `None` for deletions
    pub local_ref: Option<String>,
    pub remote_ref: String,
    pub summary: String,
}

/// One progress report from a running push
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// 9-bit opcode word, see [`OpCodes`]
    pub op_code: u16,
    pub cur_count: u64,
    pub max_count: Option<u64>,
    pub message: String,
}

/// Blocking git operations against a working copy.
pub trait GitBackend: Send + Sync {
    /// Full clone of `url` into `dir`.
    fn clone_repo(&self, url: &str, dir: &Path) -> Result<()>;

    /// Pull `origin` into the working copy.
    fn pull(&self, dir: &Path) -> Result<()>;

    /// Stage every change in the working tree, including removals.
    fn stage_all(&self, dir: &Path) -> Result<()>;

    /// Commit the staged changes.
    fn commit(&self, dir: &Path, message: &str) -> Result<()>;

    /// Push to `origin`, reporting progress as it arrives.
    /// An empty result means the push produced no ref updates to report.
    fn push(
        &self,
        dir: &Path,
        progress: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> Result<Vec<PushInfo>>;
}
