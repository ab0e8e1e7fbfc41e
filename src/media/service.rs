//! Fetch -> select -> deliver, with channel cleanup on failure.

use super::delivery::{prepare_attachment, Attachment};
use super::fetcher::Fetcher;
use super::selector::Selector;
use crate::channel::ChannelState;
use crate::error::{Error, Result};

pub struct MediaService {
    fetcher: Fetcher,
    selector: Selector,
    channels: ChannelState,
}

impl MediaService {
    pub fn new(fetcher: Fetcher, selector: Selector, channels: ChannelState) -> Self {
        Self {
            fetcher,
            selector,
            channels,
        }
    }

    /// Pick an image of `item` for the channel.
    ///
    /// Any failure except an oversized file resets the channel's current item
    /// so it is not left on something that cannot be shown. The caller turns
    /// the error into [`Error::user_message`] with the configured `id_type`.
    pub async fn send_image(&self, channel_id: &str, item: &str) -> Result<Attachment> {
        match self.fetch(channel_id, item).await {
            Ok(attachment) => Ok(attachment),
            Err(e @ Error::FileTooLarge { .. }) => {
                tracing::warn!("{}", e);
                Err(e)
            }
            Err(e) => {
                tracing::error!(
                    "error fetching image for channel {}: {} (code {:?})",
                    channel_id,
                    e,
                    e.code()
                );
                if let Err(reset) = self.channels.error_skip(channel_id).await {
                    tracing::error!("failed to reset channel {}: {}", channel_id, reset);
                }
                Err(e)
            }
        }
    }

    async fn fetch(&self, channel_id: &str, item: &str) -> Result<Attachment> {
        if item.trim().is_empty() {
            return Err(Error::BlankItem);
        }
        let files = self.fetcher.get_files(item).await?;
        tracing::debug!("images: {:?}", files);
        let (path, extension) = self.selector.choose(channel_id, &files).await?;
        prepare_attachment(&path, &extension).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{CategoryLookup, CategoryMap};
    use crate::media::{MediaIndex, RepoSync};
    use crate::store::{MemoryStore, Store};
    use crate::testing::FakeGit;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    fn service(root: &Path, store: Arc<MemoryStore>) -> MediaService {
        let mut groups = BTreeMap::new();
        groups.insert(
            "passeriformes".to_string(),
            vec!["blue jay".to_string(), "osprey".to_string()],
        );
        let categories: Arc<dyn CategoryLookup> = Arc::new(CategoryMap::from_groups(&groups));
        let channels = ChannelState::new(store);
        let fetcher = Fetcher::new(
            MediaIndex::new(root),
            Arc::new(RepoSync::new(Arc::new(FakeGit::new()), 3)),
            categories,
            "https://example/images.git",
            3,
        );
        MediaService::new(fetcher, Selector::new(channels.clone()), channels)
    }

    #[tokio::test]
    async fn test_send_image_happy_path() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("passeriformes/blue jay");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("jay.jpg"), b"x").unwrap();

        let store = Arc::new(MemoryStore::new());
        let service = service(temp.path(), store.clone());
        let attachment = service.send_image("1", "Blue Jay").await.unwrap();
        assert_eq!(attachment.filename, "image.jpg");
    }

    #[tokio::test]
    async fn test_no_images_resets_channel() {
        let temp = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.hset("channel:1", "item", "osprey").await.unwrap();
        store.hset("channel:1", "answered", "0").await.unwrap();

        let service = service(temp.path(), store.clone());
        let err = service.send_image("1", "osprey").await.unwrap_err();

        assert!(matches!(err, Error::NoImages));
        assert_eq!(store.hget("channel:1", "item").await.unwrap().as_deref(), Some(""));
        assert_eq!(
            store.hget("channel:1", "answered").await.unwrap().as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn test_blank_item_resets_channel() {
        let temp = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let service = service(temp.path(), store.clone());

        let err = service.send_image("1", "  ").await.unwrap_err();
        assert!(matches!(err, Error::BlankItem));
        assert_eq!(
            store.hget("channel:1", "answered").await.unwrap().as_deref(),
            Some("1")
        );
    }
}
