//! Upload and verification side: pushing working copies back to their
//! remotes and applying verification votes.

pub mod progress;
pub mod push;
pub mod reconcile;

pub use progress::ProgressReporter;
pub use push::{push_repo, run_push_job, PushOutcome, FAIL_STATUS};
pub use reconcile::{filename_lookup, ReconcileReport, Reconciler, RepoCopy};
