//! Cache lookup with sync-and-retry on a miss.

use super::index::MediaIndex;
use super::sync::RepoSync;
use crate::categories::CategoryLookup;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;

pub struct Fetcher {
    index: MediaIndex,
    sync: Arc<RepoSync>,
    categories: Arc<dyn CategoryLookup>,
    repo_url: String,
    max_retries: u32,
}

impl Fetcher {
    /// The index root doubles as the working copy that gets synced.
    pub fn new(
        index: MediaIndex,
        sync: Arc<RepoSync>,
        categories: Arc<dyn CategoryLookup>,
        repo_url: impl Into<String>,
        max_retries: u32,
    ) -> Self {
        Self {
            index,
            sync,
            categories,
            repo_url: repo_url.into(),
            max_retries,
        }
    }

    /// Files for `item`, syncing the repository up to `max_retries` times
    /// while the item has none locally.
    ///
    /// An empty Vec means no images could be found even after syncing.
    pub async fn get_files(&self, item: &str) -> Result<Vec<PathBuf>> {
        let item = item.trim().to_lowercase();
        let category = self
            .categories
            .category_of(&item)
            .ok_or_else(|| Error::UnknownItem(item.clone()))?;

        let mut retries = 0;
        loop {
            tracing::debug!("get_files {} retries: {}", item, retries);
            match self.index.list_files(&category, &item).await {
                Ok(files) => return Ok(files),
                Err(Error::Empty) => {}
                Err(e) => return Err(e),
            }

            if retries >= self.max_retries {
                tracing::info!("no files for {} after {} retries", item, retries);
                return Ok(Vec::new());
            }

            tracing::info!("fetching files for {}", item);
            self.sync
                .ensure_synced(&self.repo_url, self.index.root())
                .await?;
            retries += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::CategoryMap;
    use crate::testing::FakeGit;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    fn categories() -> Arc<dyn CategoryLookup> {
        let mut groups = BTreeMap::new();
        groups.insert("passeriformes".to_string(), vec!["blue jay".to_string()]);
        Arc::new(CategoryMap::from_groups(&groups))
    }

    fn fetcher(root: &Path, git: Arc<FakeGit>) -> Fetcher {
        Fetcher::new(
            MediaIndex::new(root),
            Arc::new(RepoSync::new(git, 3)),
            categories(),
            "https://example/images.git",
            3,
        )
    }

    #[tokio::test]
    async fn test_cached_files_skip_sync() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("passeriformes/blue jay");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("1.jpg"), b"x").unwrap();

        let git = Arc::new(FakeGit::new());
        let files = fetcher(temp.path(), git.clone())
            .get_files("Blue Jay")
            .await
            .unwrap();

        assert_eq!(files, vec![dir.join("1.jpg")]);
        assert!(git.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_item_gives_up_with_empty_list() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("download");
        let git = Arc::new(FakeGit::new());

        let files = fetcher(&root, git.clone())
            .get_files("Blue Jay")
            .await
            .unwrap();

        assert!(files.is_empty());
        // First miss clones, the remaining retries pull
        assert_eq!(git.count("clone"), 1);
        assert_eq!(git.count("pull"), 2);
    }

    #[tokio::test]
    async fn test_files_appear_after_clone() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("download");
        let git = Arc::new(FakeGit {
            on_clone: Some(Box::new(|dir: &Path| {
                let item = dir.join("passeriformes/blue jay");
                fs::create_dir_all(&item).unwrap();
                fs::write(item.join("a.jpg"), b"x").unwrap();
            })),
            ..Default::default()
        });

        let files = fetcher(&root, git.clone())
            .get_files("blue jay")
            .await
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(git.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let temp = tempfile::tempdir().unwrap();
        let git = Arc::new(FakeGit::new());
        let err = fetcher(temp.path(), git)
            .get_files("osprey")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownItem(item) if item == "osprey"));
    }

    #[tokio::test]
    async fn test_sync_failure_propagates() {
        let temp = tempfile::tempdir().unwrap();
        let git = Arc::new(FakeGit {
            fail_pull: true,
            ..Default::default()
        });
        let err = fetcher(temp.path(), git)
            .get_files("blue jay")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sync(_)));
    }
}
