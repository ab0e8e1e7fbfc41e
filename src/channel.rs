//! Per-channel quiz state (`channel:<id>` hash).
//!
//! Only the rotation index is interpreted here; `item`, `answered` and `prevI`
//! belong to the command layer and are only initialised or reset.

use crate::error::Result;
use crate::store::{keys, Store};
use std::sync::Arc;

/// Initial `prevJ`, marking a channel that has never had an image selected
pub const PREV_J_SENTINEL: usize = 20;

#[derive(Clone)]
pub struct ChannelState {
    store: Arc<dyn Store>,
}

impl ChannelState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create the channel record if missing. Returns true if it was created.
    pub async fn setup(&self, channel_id: &str) -> Result<bool> {
        let key = keys::channel(channel_id);
        if self.store.exists(&key).await? {
            tracing::debug!("channel {} data ok", channel_id);
            return Ok(false);
        }
        self.store
            .hset_multiple(
                &key,
                &[
                    ("item", String::new()),
                    ("answered", "1".to_string()),
                    ("prevJ", PREV_J_SENTINEL.to_string()),
                    ("prevI", String::new()),
                ],
            )
            .await?;
        tracing::info!("channel {} data added", channel_id);
        Ok(true)
    }

    /// Clear the current item so the channel is not stuck on one that failed.
    pub async fn error_skip(&self, channel_id: &str) -> Result<()> {
        let key = keys::channel(channel_id);
        self.store
            .hset_multiple(&key, &[("item", String::new()), ("answered", "1".to_string())])
            .await?;
        tracing::info!("channel {} item reset after error", channel_id);
        Ok(())
    }

    /// Last selected rotation index. Missing or unparseable values read as the sentinel.
    pub async fn prev_j(&self, channel_id: &str) -> Result<usize> {
        let raw = self
            .store
            .hget(&keys::channel(channel_id), "prevJ")
            .await?;
        Ok(match raw.as_deref().map(str::trim).map(str::parse::<usize>) {
            Some(Ok(value)) => value,
            Some(Err(_)) => {
                tracing::warn!(
                    "channel {} has unparseable prevJ {:?}, using sentinel",
                    channel_id,
                    raw
                );
                PREV_J_SENTINEL
            }
            None => PREV_J_SENTINEL,
        })
    }

    pub async fn set_prev_j(&self, channel_id: &str, index: usize) -> Result<()> {
        self.store
            .hset(&keys::channel(channel_id), "prevJ", &index.to_string())
            .await?;
        Ok(())
    }
}
