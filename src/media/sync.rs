//! Clone-or-pull of a media repository working copy.

use crate::error::{Error, Result};
use crate::git::GitBackend;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// What `ensure_synced` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Pulled,
}

/// Keeps local working copies up to date.
///
/// Git calls block, so they run on the blocking pool with at most
/// `max_workers` in flight. There is no timeout on the network operation.
pub struct RepoSync {
    git: Arc<dyn GitBackend>,
    permits: Arc<Semaphore>,
}

impl RepoSync {
    pub fn new(git: Arc<dyn GitBackend>, max_workers: usize) -> Self {
        Self {
            git,
            permits: Arc::new(Semaphore::new(max_workers.max(1))),
        }
    }

    /// Clone `repo_url` into `local_dir` if it does not exist, otherwise pull `origin`.
    pub async fn ensure_synced(&self, repo_url: &str, local_dir: &Path) -> Result<SyncAction> {
        tracing::info!("syncing {}", local_dir.display());
        let action = match tokio::fs::read_dir(local_dir).await {
            Ok(_) => SyncAction::Pulled,
            Err(e) if e.kind() == ErrorKind::NotFound => SyncAction::Cloned,
            Err(e) => {
                return Err(Error::Sync(format!(
                    "cannot list {}: {}",
                    local_dir.display(),
                    e
                )))
            }
        };

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::Sync(e.to_string()))?;
        let git = self.git.clone();
        let url = repo_url.to_string();
        let dir: PathBuf = local_dir.to_path_buf();

        match action {
            SyncAction::Cloned => tracing::info!("{} doesn't exist, cloning", dir.display()),
            SyncAction::Pulled => tracing::info!("{} exists, pulling", dir.display()),
        }

        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            match action {
                SyncAction::Cloned => git.clone_repo(&url, &dir),
                SyncAction::Pulled => git.pull(&dir),
            }
        })
        .await
        .map_err(|e| Error::Sync(format!("sync task failed: {}", e)))?;

        result.map_err(|e| match e {
            Error::Sync(_) => e,
            other => Error::Sync(other.to_string()),
        })?;

        tracing::info!("done syncing {}", local_dir.display());
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGit;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn test_clone_then_pull() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("download");
        let git = Arc::new(FakeGit::new());
        let sync = RepoSync::new(git.clone(), 3);

        let first = sync.ensure_synced("https://example/repo.git", &dir).await.unwrap();
        assert_eq!(first, SyncAction::Cloned);

        let second = sync.ensure_synced("https://example/repo.git", &dir).await.unwrap();
        let third = sync.ensure_synced("https://example/repo.git", &dir).await.unwrap();
        assert_eq!(second, SyncAction::Pulled);
        assert_eq!(third, SyncAction::Pulled);

        assert_eq!(git.count("clone"), 1);
        assert_eq!(git.count("pull"), 2);
    }

    #[tokio::test]
    async fn test_pull_failure_is_sync_error() {
        let temp = tempfile::tempdir().unwrap();
        let git = Arc::new(FakeGit {
            fail_pull: true,
            ..Default::default()
        });
        let sync = RepoSync::new(git, 3);

        let err = sync
            .ensure_synced("https://example/repo.git", temp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sync(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let temp = tempfile::tempdir().unwrap();
        let git = Arc::new(FakeGit {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let sync = Arc::new(RepoSync::new(git.clone(), 3));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let sync = sync.clone();
            let dir = temp.path().to_path_buf();
            handles.push(tokio::spawn(async move {
                sync.ensure_synced("https://example/repo.git", &dir).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(git.calls().len(), 8);
        assert!(git.max_in_flight.load(Ordering::SeqCst) <= 3);
    }
}
