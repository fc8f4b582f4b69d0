//! GitRepo helper for integration tests.
//!
//! Provides a temporary git repository with a fixed author identity.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A temporary git repository, removed on drop.
pub struct GitRepo {
    dir: TempDir,
}

impl GitRepo {
    /// Create a new repository in a temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let repo = Self { dir };
        repo.git(&["init", "-q"]);
        repo.git(&["config", "core.logAllRefUpdates", "true"]);
        repo
    }

    /// Get the path to the repository root.
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Execute a git command in this repository.
    ///
    /// # Panics
    ///
    /// Panics if the command fails to execute or returns a non-zero exit code.
    pub fn git(&self, args: &[&str]) -> String {
        self.git_with_env(args, &[])
    }

    fn git_with_env(&self, args: &[&str], envs: &[(&str, String)]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .env("GIT_AUTHOR_NAME", "Test User")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "Test User")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .envs(envs.iter().map(|(k, v)| (*k, v.as_str())))
            .output()
            .expect("Failed to execute git command");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!(
                "git {:?} failed with exit code {:?}:\n{}",
                args,
                output.status.code(),
                stderr
            );
        }

        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    pub fn write_file(&self, path: &str, content: &str) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(full, content).expect("Failed to write file");
    }

    pub fn remove_file(&self, path: &str) {
        fs::remove_file(self.dir.path().join(path)).expect("Failed to remove file");
    }

    /// Stage everything and commit with `message`.
    pub fn commit_all(&self, message: &str) -> String {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", message]);
        self.head()
    }

    /// Stage everything and commit with author and committer dates fixed
    /// to `epoch_secs` (UTC).
    pub fn commit_all_at(&self, message: &str, epoch_secs: i64) -> String {
        let date = format!("@{} +0000", epoch_secs);
        self.git(&["add", "-A"]);
        self.git_with_env(
            &["commit", "-q", "-m", message],
            &[("GIT_AUTHOR_DATE", date.clone()), ("GIT_COMMITTER_DATE", date)],
        );
        self.head()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"]).trim().to_string()
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}
