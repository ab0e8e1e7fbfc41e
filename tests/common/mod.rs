//! Helpers for tests that drive the real git executable.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Skip the test when git is not installed.
macro_rules! require_git {
    () => {
        if !common::git_available() {
            eprintln!("git not available, skipping");
            return;
        }
    };
}

pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=test", "-c", "user.email=test@localhost"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a bare repository under `root` seeded with `files` (relative path, contents).
pub fn seed_remote(root: &Path, files: &[(&str, &str)]) -> PathBuf {
    let remote = root.join("remote.git");
    let seed = root.join("seed");
    fs::create_dir_all(&remote).unwrap();
    fs::create_dir_all(&seed).unwrap();

    git(&remote, &["init", "--quiet", "--bare", "--initial-branch=main"]);
    git(&seed, &["init", "--quiet", "--initial-branch=main"]);

    fs::write(seed.join("README.md"), "media\n").unwrap();
    for (path, contents) in files {
        let path = seed.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    git(&seed, &["add", "--all"]);
    git(&seed, &["commit", "--quiet", "-m", "seed"]);
    git(&seed, &["push", "--quiet", remote.to_str().unwrap(), "main"]);
    remote
}

/// Commit a new file straight into the remote through a scratch clone.
pub fn commit_to_remote(root: &Path, remote: &Path, path: &str, contents: &[u8]) {
    let scratch = root.join(format!("scratch-{}", path.replace('/', "_")));
    let output = Command::new("git")
        .args(["clone", "--quiet"])
        .arg(remote)
        .arg(&scratch)
        .output()
        .unwrap();
    assert!(output.status.success());

    let file = scratch.join(path);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, contents).unwrap();
    git(&scratch, &["add", "--all"]);
    git(&scratch, &["commit", "--quiet", "-m", "remote change"]);
    git(&scratch, &["push", "--quiet", "origin", "main"]);
}

/// Files tracked at the tip of `main` in a bare repository.
pub fn remote_files(remote: &Path) -> Vec<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(remote)
        .args(["ls-tree", "-r", "--name-only", "main"])
        .output()
        .unwrap();
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}
