//! Test doubles shared by unit tests.

use crate::error::{Error, Result};
use crate::git::{GitBackend, ProgressEvent, PushFlags, PushInfo};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type CloneHook = Box<dyn Fn(&Path) + Send + Sync>;

/// Records every call. Clone creates the target directory (and runs
/// `on_clone`), push replays queued results and progress events.
/// `fail_clone` and `fail_pull` make those calls fail.
#[derive(Default)]
pub struct FakeGit {
    pub calls: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub delay: Option<Duration>,
    pub fail_clone: bool,
    pub fail_pull: bool,
    pub on_clone: Option<CloneHook>,
    pub push_results: Mutex<VecDeque<Vec<PushInfo>>>,
    pub progress: Vec<ProgressEvent>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next push as a single ref with `flags`.
    pub fn with_push(self, flags: PushFlags) -> Self {
        self.push_results.lock().unwrap().push_back(vec![PushInfo {
            flags,
            local_ref: Some("refs/heads/main".to_string()),
            remote_ref: "refs/heads/main".to_string(),
            summary: String::new(),
        }]);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn enter(&self, call: String) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GitBackend for FakeGit {
    fn clone_repo(&self, url: &str, dir: &Path) -> Result<()> {
        self.enter(format!("clone {}", url));
        if self.fail_clone {
            return Err(Error::Git("repository not found".to_string()));
        }
        std::fs::create_dir_all(dir)?;
        if let Some(hook) = &self.on_clone {
            hook(dir);
        }
        Ok(())
    }

    fn pull(&self, dir: &Path) -> Result<()> {
        self.enter(format!("pull {}", dir.display()));
        if self.fail_pull {
            return Err(Error::Git("network unreachable".to_string()));
        }
        Ok(())
    }

    fn stage_all(&self, dir: &Path) -> Result<()> {
        self.enter(format!("add {}", dir.display()));
        Ok(())
    }

    fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        self.enter(format!("commit {} {}", dir.display(), message));
        Ok(())
    }

    fn push(
        &self,
        dir: &Path,
        progress: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> Result<Vec<PushInfo>> {
        self.enter(format!("push {}", dir.display()));
        for event in &self.progress {
            progress(event.clone());
        }
        Ok(self
            .push_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}
