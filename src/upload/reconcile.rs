//! Batch reconciliation of verification votes into repository changes.
//!
//! # Pass
//!
//! 1. Clone or pull both working copies; a failed sync ends the pass with
//!    every vote left in place
//! 2. Index every file under the verification working copy by file name
//! 3. Snapshot then clear `invalid` + `duplicate` entries at or over the threshold
//! 4. Snapshot then clear `valid` entries at or over the threshold
//! 5. Delete files voted invalid or duplicate
//! 6. Move files voted valid (and not deleted) into the image repository
//! 7. Push both repositories if anything changed, each independently
//!
//! Votes that arrive between the snapshot and the filesystem changes for an
//! identifier already claimed in this pass are dropped. Jobs run one at a
//! time, so this does not happen in practice.

use super::push::{push_repo, PushOutcome};
use crate::categories::CategoryLookup;
use crate::error::Result;
use crate::git::GitBackend;
use crate::media::RepoSync;
use crate::store::keys::{self, VoteKind};
use crate::store::Store;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Commit message used for both repositories
pub const VERIFICATION_COMMIT_MESSAGE: &str = "Update through verification!";

/// What one reconciliation pass did
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub deleted: Vec<String>,
    pub moved: Vec<String>,
    /// Identifiers voted on but not found (or not placeable) on disk
    pub skipped: Vec<String>,
    /// `None` when no push was attempted
    pub verify_push: Option<Result<PushOutcome>>,
    pub image_push: Option<Result<PushOutcome>>,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        self.verify_push.is_some()
    }
}

/// Map file name -> path for every file under `root`, skipping hidden entries such as `.git`.
pub fn filename_lookup(root: &Path) -> HashMap<String, PathBuf> {
    let mut lookup: HashMap<String, PathBuf> = HashMap::new();
    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.into_path();
        if let Some(previous) = lookup.get(&name) {
            tracing::warn!(
                "{} found at both {} and {}, using the latter",
                name,
                previous.display(),
                path.display()
            );
        }
        lookup.insert(name, path);
    }
    lookup
}

/// A remote repository and the working copy it is synced into
#[derive(Debug, Clone)]
pub struct RepoCopy {
    pub url: String,
    pub root: PathBuf,
}

impl RepoCopy {
    pub fn new(url: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            root: root.into(),
        }
    }
}

pub struct Reconciler {
    store: Arc<dyn Store>,
    git: Arc<dyn GitBackend>,
    sync: Arc<RepoSync>,
    categories: Arc<dyn CategoryLookup>,
    verify: RepoCopy,
    image: RepoCopy,
    threshold: f64,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn Store>,
        git: Arc<dyn GitBackend>,
        sync: Arc<RepoSync>,
        categories: Arc<dyn CategoryLookup>,
        verify: RepoCopy,
        image: RepoCopy,
        threshold: f64,
    ) -> Self {
        Self {
            store,
            git,
            sync,
            categories,
            verify,
            image,
            threshold,
        }
    }

    /// Read then clear the eligible members of the given vote sets.
    async fn drain(&self, kinds: &[VoteKind]) -> Result<BTreeSet<String>> {
        let mut claimed = BTreeSet::new();
        for kind in kinds {
            let key = keys::verify_images(*kind);
            claimed.extend(self.store.zrange_by_score_min(&key, self.threshold).await?);
        }
        if !claimed.is_empty() {
            for kind in kinds {
                let key = keys::verify_images(*kind);
                self.store
                    .zrem_range_by_score_min(&key, self.threshold)
                    .await?;
            }
        }
        Ok(claimed)
    }

    /// Run one reconciliation pass.
    pub async fn move_images(&self) -> Result<ReconcileReport> {
        tracing::info!("checking for move");
        // Votes are only claimed once both copies are real working copies
        for copy in [&self.verify, &self.image] {
            self.sync.ensure_synced(&copy.url, &copy.root).await?;
        }

        let root = self.verify.root.clone();
        let lookup = tokio::task::spawn_blocking(move || filename_lookup(&root))
            .await
            .map_err(|e| crate::error::Error::Git(format!("lookup task failed: {}", e)))?;

        let delete = self.drain(&[VoteKind::Invalid, VoteKind::Duplicate]).await?;
        let valid = self.drain(&[VoteKind::Valid]).await?;

        let mut report = ReconcileReport::default();

        for image in &delete {
            match lookup.get(image) {
                Some(path) => match tokio::fs::remove_file(path).await {
                    Ok(()) => report.deleted.push(image.clone()),
                    Err(e) => {
                        tracing::warn!("failed to delete {}: {}", path.display(), e);
                        report.skipped.push(image.clone());
                    }
                },
                None => {
                    tracing::warn!("voted image {} not found for delete", image);
                    report.skipped.push(image.clone());
                }
            }
        }

        for image in valid.difference(&delete) {
            match self.move_to_image_repo(image, &lookup).await {
                Ok(true) => report.moved.push(image.clone()),
                Ok(false) => report.skipped.push(image.clone()),
                Err(e) => {
                    tracing::warn!("failed to move {}: {}", image, e);
                    report.skipped.push(image.clone());
                }
            }
        }

        if delete.is_empty() && valid.is_empty() {
            tracing::info!("no changes to update!");
            return Ok(report);
        }

        let verify_push = push_repo(
            self.git.clone(),
            self.verify.root.clone(),
            VERIFICATION_COMMIT_MESSAGE,
            None,
        )
        .await;
        log_push("verify repo", &verify_push);

        let image_push = push_repo(
            self.git.clone(),
            self.image.root.clone(),
            VERIFICATION_COMMIT_MESSAGE,
            None,
        )
        .await;
        log_push("image repo", &image_push);

        report.verify_push = Some(verify_push);
        report.image_push = Some(image_push);
        Ok(report)
    }

    /// Copy into `<image_root>/<category>/<item>/` and remove the original.
    /// The item is the name of the directory containing the file.
    async fn move_to_image_repo(
        &self,
        image: &str,
        lookup: &HashMap<String, PathBuf>,
    ) -> Result<bool> {
        let Some(path) = lookup.get(image) else {
            tracing::warn!("voted image {} not found for move", image);
            return Ok(false);
        };
        let Some(item) = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().to_lowercase())
        else {
            return Ok(false);
        };
        let Some(category) = self.categories.category_of(&item) else {
            tracing::warn!("no category for {}, leaving {} in place", item, path.display());
            return Ok(false);
        };

        let target_dir = self.image.root.join(&category).join(&item);
        tokio::fs::create_dir_all(&target_dir).await?;
        tokio::fs::copy(path, target_dir.join(image)).await?;
        tokio::fs::remove_file(path).await?;
        tracing::debug!("moved {} to {}", image, target_dir.display());
        Ok(true)
    }
}

fn log_push(name: &str, result: &Result<PushOutcome>) {
    match result {
        Ok(Some(flags)) => tracing::info!("{} push success! {:?}", name, flags),
        Ok(None) => tracing::error!("{} failed completely!", name),
        Err(e) => tracing::error!("{} push failed: {}", name, e),
    }
}
