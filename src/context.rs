//! Shared handles passed explicitly to every component.

use crate::categories::{CategoryLookup, CategoryMap};
use crate::channel::ChannelState;
use crate::config::Config;
use crate::error::Result;
use crate::git::{GitBackend, GitCli};
use crate::media::{Fetcher, MediaIndex, MediaService, RepoSync, Selector};
use crate::store::{keys, RedisStore, Store};
use crate::upload::{run_push_job, PushOutcome, Reconciler, RepoCopy};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct Context {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub git: Arc<dyn GitBackend>,
    pub categories: Arc<dyn CategoryLookup>,
    pub sync: Arc<RepoSync>,
}

impl Context {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        git: Arc<dyn GitBackend>,
        categories: Arc<dyn CategoryLookup>,
    ) -> Self {
        let sync = Arc::new(RepoSync::new(git.clone(), config.max_sync_workers));
        Self {
            config: Arc::new(config),
            store,
            git,
            categories,
            sync,
        }
    }

    /// Production wiring: Redis store, git executable, categories from config.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = RedisStore::new(&config.redis_url)?;
        let git = GitCli::new(&config.git_author_name, &config.git_author_email);
        let categories = CategoryMap::from_groups(&config.categories);
        tracing::debug!(
            "{} items across {} categories",
            categories.len(),
            config.categories.len()
        );
        Ok(Self::new(
            config,
            Arc::new(store),
            Arc::new(git),
            Arc::new(categories),
        ))
    }

    pub fn channels(&self) -> ChannelState {
        ChannelState::new(self.store.clone())
    }

    pub fn media_service(&self) -> MediaService {
        let fetcher = Fetcher::new(
            MediaIndex::new(&self.config.download_dir),
            self.sync.clone(),
            self.categories.clone(),
            &self.config.image_repo_url,
            self.config.max_retries,
        );
        let channels = self.channels();
        MediaService::new(fetcher, Selector::new(channels.clone()), channels)
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            self.store.clone(),
            self.git.clone(),
            self.sync.clone(),
            self.categories.clone(),
            RepoCopy::new(&self.config.validation_repo_url, self.config.validation_root()),
            RepoCopy::new(&self.config.image_repo_url, &self.config.download_dir),
            self.config.vote_threshold,
        )
    }

    /// Push the verification working copy on behalf of `user_id`.
    pub async fn push_upload(&self, commit_message: &str, user_id: &str) -> Result<PushOutcome> {
        run_push_job(
            self.git.clone(),
            self.store.clone(),
            self.config.validation_root(),
            commit_message,
            user_id,
            self.config.progress_log_chance,
            self.config.status_ttl_secs,
        )
        .await
    }

    /// Clone or pull the verification working copy so uploads have somewhere to land.
    pub async fn sync_validation_repo(&self) -> Result<()> {
        self.sync
            .ensure_synced(&self.config.validation_repo_url, &self.config.validation_root())
            .await?;
        Ok(())
    }

    /// Current upload status record for `user_id` (empty once expired).
    pub async fn upload_status(&self, user_id: &str) -> Result<HashMap<String, String>> {
        Ok(self.store.hgetall(&keys::upload_status(user_id)).await?)
    }
}
