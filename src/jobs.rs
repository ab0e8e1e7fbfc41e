//! Background job queue.
//!
//! Pushes and reconciliation passes touch the same working copies, so a
//! single worker drains the queue and runs one job at a time.

use crate::context::Context;
use crate::error::{Error, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Pending jobs allowed before `enqueue` waits
pub const JOB_CHANNEL_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Push the verification repository for a user's upload
    Push {
        commit_message: String,
        user_id: String,
    },
    /// Apply verification votes
    MoveImages,
}

pub type JobReceiver = mpsc::Receiver<Job>;

#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
}

impl JobQueue {
    pub fn channel() -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::channel(JOB_CHANNEL_SIZE);
        (Self { tx }, rx)
    }

    /// Create a queue and spawn its worker. The worker exits once every
    /// `JobQueue` handle is dropped and the backlog is drained.
    pub fn start(ctx: Context) -> (Self, JoinHandle<()>) {
        let (queue, rx) = Self::channel();
        let handle = tokio::spawn(run_worker(ctx, rx));
        (queue, handle)
    }

    pub async fn enqueue(&self, job: Job) -> Result<()> {
        tracing::debug!("enqueue {:?}", job);
        self.tx.send(job).await.map_err(|_| Error::QueueClosed)
    }
}

/// Run jobs in arrival order until the channel closes.
pub async fn run_worker(ctx: Context, mut rx: JobReceiver) {
    tracing::info!("job worker started");
    while let Some(job) = rx.recv().await {
        run_job(&ctx, job).await;
    }
    tracing::info!("job worker stopped");
}

async fn run_job(ctx: &Context, job: Job) {
    match job {
        Job::Push {
            commit_message,
            user_id,
        } => match ctx.push_upload(&commit_message, &user_id).await {
            Ok(Some(flags)) => {
                tracing::info!("upload push for {} finished: {:?}", user_id, flags)
            }
            Ok(None) => tracing::warn!("upload push for {} reported nothing", user_id),
            Err(e) => tracing::error!("upload push for {} failed: {}", user_id, e),
        },
        Job::MoveImages => match ctx.reconciler().move_images().await {
            Ok(report) => tracing::info!(
                deleted = report.deleted.len(),
                moved = report.moved.len(),
                skipped = report.skipped.len(),
                "reconcile pass finished"
            ),
            Err(e) => tracing::error!("reconcile pass failed: {}", e),
        },
    }
}

/// Enqueue [`Job::MoveImages`] every `interval`, starting one interval from now.
pub fn spawn_reconcile_timer(queue: JobQueue, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if queue.enqueue(Job::MoveImages).await.is_err() {
                tracing::debug!("job queue closed, stopping reconcile timer");
                break;
            }
        }
    })
}
