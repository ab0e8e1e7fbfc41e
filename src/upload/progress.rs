//! Push progress persisted to the per-user upload status record.

use crate::error::Result;
use crate::git::{decode_opcodes, ProgressEvent};
use crate::store::{keys, Store};
use rand::Rng;
use std::sync::Arc;

#[derive(Clone)]
pub struct ProgressReporter {
    store: Arc<dyn Store>,
    user_id: String,
    log_chance: f64,
}

impl ProgressReporter {
    pub fn new(store: Arc<dyn Store>, user_id: impl Into<String>, log_chance: f64) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            log_chance: log_chance.clamp(0.0, 1.0),
        }
    }

    /// Record one progress event. Every call writes the status record;
    /// only a sample of events is logged.
    pub async fn report(&self, event: &ProgressEvent) -> Result<()> {
        let op_names = decode_opcodes(event.op_code);
        let fields = [
            ("op_code", serde_json::to_string(&op_names)?),
            ("cur_count", serde_json::to_string(&event.cur_count)?),
            ("max_count", serde_json::to_string(&event.max_count)?),
            ("message", serde_json::to_string(&event.message)?),
        ];
        self.store
            .hset_multiple(&keys::upload_status(&self.user_id), &fields)
            .await?;

        let sampled = rand::thread_rng().gen_bool(self.log_chance);
        if should_log(&op_names, sampled) {
            tracing::info!(
                user = %self.user_id,
                "push progress {:?} {}/{:?} {}",
                op_names,
                event.cur_count,
                event.max_count,
                event.message
            );
        }
        Ok(())
    }
}

/// Stage boundaries are always logged; everything else only when sampled.
pub fn should_log(op_names: &[&str], sampled: bool) -> bool {
    sampled || op_names.iter().any(|name| *name == "BEGIN" || *name == "END")
}
