//! Pull, commit and push a working copy, decoding the push result.

use super::progress::ProgressReporter;
use crate::error::{Error, Result};
use crate::git::{decode_push_flags, GitBackend, ProgressEvent};
use crate::store::{keys, Store};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Flag names of the first pushed ref, or `None` when the push reported no refs.
pub type PushOutcome = Option<Vec<&'static str>>;

/// Status written when a push job produced no usable result
pub const FAIL_STATUS: &str = "FAIL";

/// Pull `origin`, stage everything, commit and push.
///
/// Progress events are forwarded to `reporter` while the blocking push runs.
/// Reporter write failures are logged and do not fail the push.
pub async fn push_repo(
    git: Arc<dyn GitBackend>,
    dir: PathBuf,
    commit_message: &str,
    reporter: Option<ProgressReporter>,
) -> Result<PushOutcome> {
    let message = commit_message.to_string();
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressEvent>();

    let handle = tokio::task::spawn_blocking(move || {
        git.pull(&dir)?;
        git.stage_all(&dir)?;
        git.commit(&dir, &message)?;
        let mut forward = |event: ProgressEvent| {
            // Receiver only goes away if the task awaiting us was dropped
            let _ = progress_tx.send(event);
        };
        git.push(&dir, &mut forward)
    });

    // Ends once the blocking task drops its sender
    while let Some(event) = progress_rx.recv().await {
        if let Some(reporter) = &reporter {
            if let Err(e) = reporter.report(&event).await {
                tracing::warn!("failed to record push progress: {}", e);
            }
        }
    }

    let results = handle
        .await
        .map_err(|e| Error::Git(format!("push task failed: {}", e)))??;

    let Some(first) = results.first() else {
        return Ok(None);
    };
    let flags = decode_push_flags(first.flags.bits());
    tracing::info!("push flags: {:?}", flags);
    Ok(Some(flags))
}

/// Background job: push the verification repository for a user's upload
/// and publish the outcome in their status record.
pub async fn run_push_job(
    git: Arc<dyn GitBackend>,
    store: Arc<dyn Store>,
    dir: PathBuf,
    commit_message: &str,
    user_id: &str,
    progress_log_chance: f64,
    status_ttl_secs: u64,
) -> Result<PushOutcome> {
    tracing::info!("pushing upload for user {}", user_id);
    let reporter = ProgressReporter::new(store.clone(), user_id, progress_log_chance);
    let outcome = push_repo(git, dir, commit_message, Some(reporter)).await;

    let status = match &outcome {
        Ok(Some(flags)) => flags.clone(),
        Ok(None) => {
            tracing::error!("push operation failed completely!");
            vec![FAIL_STATUS]
        }
        Err(e) => {
            tracing::error!("push operation failed: {}", e);
            vec![FAIL_STATUS]
        }
    };

    let status_key = keys::upload_status(user_id);
    store
        .hset_multiple(
            &status_key,
            &[
                ("status", serde_json::to_string(&status)?),
                ("end", chrono::Utc::now().timestamp().to_string()),
            ],
        )
        .await?;
    store.delete(&keys::upload_save(user_id)).await?;
    store.expire(&status_key, status_ttl_secs).await?;

    outcome
}
