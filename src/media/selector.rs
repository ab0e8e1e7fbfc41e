//! Round-robin image selection with per-channel rotation state.

use super::MediaFile;
use crate::channel::ChannelState;
use crate::error::{Error, Result};
use std::path::PathBuf;

/// Rotation scan starting after `prev_j`.
///
/// Returns the first index accepted by `is_valid`. A rejected candidate at
/// `prev_j` ends the scan early, so at most `len` candidates are examined.
pub fn pick_index(
    prev_j: usize,
    len: usize,
    mut is_valid: impl FnMut(usize) -> bool,
) -> Result<usize> {
    if len == 0 {
        return Err(Error::NoImages);
    }

    let j = (prev_j % len + 1) % len;
    for x in 0..len {
        let y = (x + j) % len;
        if is_valid(y) {
            return Ok(y);
        }
        if y == prev_j {
            break;
        }
    }
    Err(Error::NoValidImages)
}

/// Blocking half of [`Selector::choose`]: stat candidates in rotation order.
fn scan(prev_j: usize, candidates: &[PathBuf]) -> Result<usize> {
    pick_index(prev_j, candidates.len(), |i| match MediaFile::stat(&candidates[i]) {
        Ok(file) => {
            tracing::debug!(
                "candidate {} extension: {} size: {}",
                i,
                file.extension,
                file.size
            );
            file.is_valid()
        }
        Err(e) => {
            tracing::warn!("cannot stat {}: {}", candidates[i].display(), e);
            false
        }
    })
}

pub struct Selector {
    channels: ChannelState,
}

impl Selector {
    pub fn new(channels: ChannelState) -> Self {
        Self { channels }
    }

    /// Pick the next deliverable file for the channel and persist its index.
    ///
    /// Returns the path and its extension.
    pub async fn choose(
        &self,
        channel_id: &str,
        candidates: &[PathBuf],
    ) -> Result<(PathBuf, String)> {
        if candidates.is_empty() {
            return Err(Error::NoImages);
        }

        let prev_j = self.channels.prev_j(channel_id).await?;
        tracing::debug!("prevJ: {}", prev_j);

        // Stats run on the blocking pool, all candidates in one task
        let paths = candidates.to_vec();
        let index = tokio::task::spawn_blocking(move || scan(prev_j, &paths))
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!("selection task failed: {}", e)))
            })??;

        self.channels.set_prev_j(channel_id, index).await?;

        let path = candidates[index].clone();
        let extension = super::extension_of(&path);
        tracing::info!("found one! {}", path.display());
        Ok((path, extension))
    }
}
