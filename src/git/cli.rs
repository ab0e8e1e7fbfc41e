//! [`GitBackend`] driving the `git` executable.

use super::porcelain::{parse_push_output, split_progress, ProgressParser};
use super::{GitBackend, ProgressEvent, PushInfo};
use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Runs git as a subprocess. Commits are authored with the configured identity.
#[derive(Debug, Clone)]
pub struct GitCli {
    author_name: String,
    author_email: String,
}

impl GitCli {
    pub fn new(author_name: impl Into<String>, author_email: impl Into<String>) -> Self {
        Self {
            author_name: author_name.into(),
            author_email: author_email.into(),
        }
    }

    fn command(&self, dir: Option<&Path>) -> Command {
        let mut cmd = Command::new("git");
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        cmd.arg("-c")
            .arg(format!("user.name={}", self.author_name))
            .arg("-c")
            .arg(format!("user.email={}", self.author_email));
        cmd.stdin(Stdio::null());
        cmd
    }

    fn run(&self, mut cmd: Command, what: &str) -> Result<Output> {
        let output = cmd
            .output()
            .map_err(|e| Error::Git(format!("failed to spawn git {}: {}", what, e)))?;
        if !output.status.success() {
            return Err(Error::Git(format!(
                "git {} failed ({}): {}",
                what,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }

    fn has_staged_changes(&self, dir: &Path) -> Result<bool> {
        let mut cmd = self.command(Some(dir));
        cmd.args(["diff", "--cached", "--quiet"]);
        let status = cmd
            .status()
            .map_err(|e| Error::Git(format!("failed to spawn git diff: {}", e)))?;
        match status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(Error::Git(format!("git diff --cached failed ({})", status))),
        }
    }
}

impl GitBackend for GitCli {
    fn clone_repo(&self, url: &str, dir: &Path) -> Result<()> {
        let mut cmd = self.command(None);
        cmd.arg("clone").arg(url).arg(dir);
        self.run(cmd, "clone").map_err(|e| Error::Sync(e.to_string()))?;
        Ok(())
    }

    fn pull(&self, dir: &Path) -> Result<()> {
        let mut cmd = self.command(Some(dir));
        cmd.args(["pull", "--no-rebase", "--no-edit", "origin"]);
        self.run(cmd, "pull").map_err(|e| Error::Sync(e.to_string()))?;
        Ok(())
    }

    fn stage_all(&self, dir: &Path) -> Result<()> {
        let mut cmd = self.command(Some(dir));
        cmd.args(["add", "--all"]);
        self.run(cmd, "add")?;
        Ok(())
    }

    fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        if !self.has_staged_changes(dir)? {
            tracing::debug!("nothing staged in {}, skipping commit", dir.display());
            return Ok(());
        }
        let mut cmd = self.command(Some(dir));
        cmd.args(["commit", "--quiet", "-m", message]);
        self.run(cmd, "commit")?;
        Ok(())
    }

    fn push(
        &self,
        dir: &Path,
        progress: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> Result<Vec<PushInfo>> {
        let mut cmd = self.command(Some(dir));
        cmd.args(["push", "--porcelain", "--progress", "origin"]);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Git(format!("failed to spawn git push: {}", e)))?;

        // Porcelain output on stdout is a few lines per ref, so draining stderr
        // first cannot fill the stdout pipe.
        let mut stderr_text = String::new();
        if let Some(mut stderr) = child.stderr.take() {
            let mut parser = ProgressParser::new();
            let mut pending = String::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stderr.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                pending.push_str(&String::from_utf8_lossy(&buf[..n]));
                // Only complete pieces are parsed; the tail may be a partial line
                let cut = pending.rfind(['\r', '\n']).map(|i| i + 1).unwrap_or(0);
                let complete: String = pending.drain(..cut).collect();
                for piece in split_progress(&complete) {
                    if let Some(event) = parser.parse_line(piece) {
                        progress(event);
                    }
                    stderr_text.push_str(piece);
                    stderr_text.push('\n');
                }
            }
            for piece in split_progress(&pending) {
                if let Some(event) = parser.parse_line(piece) {
                    progress(event);
                }
                stderr_text.push_str(piece);
                stderr_text.push('\n');
            }
        }

        let mut stdout_text = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_string(&mut stdout_text)?;
        }
        let status = child.wait()?;

        let results = parse_push_output(&stdout_text);
        if !status.success() && results.is_empty() {
            tracing::warn!(
                "git push in {} failed ({}) without ref results: {}",
                dir.display(),
                status,
                stderr_text.trim()
            );
        }
        Ok(results)
    }
}
