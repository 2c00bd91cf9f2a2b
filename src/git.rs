//! Git repository operations.
//!
//! Everything here shells out to the `git` binary. Reads go through
//! plumbing (`rev-parse`, `log`), writes through `commit-tree` and
//! `update-ref`; the working tree and index are never touched.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::commit::{self, CommitRecord, Identity};

/// A git repository handle that provides the operations the rewrite needs.
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Find the git repository root starting from the given path.
    pub fn discover(start: &Path) -> Result<Self, Error> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(start)
            .output()
            .map_err(|e| Error::Exec(format!("git rev-parse: {e}")))?;

        if !output.status.success() {
            return Err(Error::NotARepo(start.display().to_string()));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    /// Open a repository rooted at the given path without discovery.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the repository root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a ref or revision expression to a commit hash.
    pub fn rev_parse(&self, rev: &str) -> Result<String, Error> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", &format!("{rev}^{{commit}}")])
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::Exec(format!("git rev-parse: {e}")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(Error::BadRevision(rev.to_string()))
        }
    }

    /// The full ref name of the currently checked-out branch, or `None` on a
    /// detached HEAD.
    pub fn current_branch(&self) -> Result<Option<String>, Error> {
        let output = Command::new("git")
            .args(["symbolic-ref", "--quiet", "HEAD"])
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::Exec(format!("git symbolic-ref: {e}")))?;

        if output.status.success() {
            Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            ))
        } else {
            Ok(None)
        }
    }

    /// Read the first-parent ancestry path strictly after `from` up to and
    /// including `to`, oldest first.
    pub fn read_range(&self, from: &str, to: &str) -> Result<Vec<CommitRecord>, Error> {
        let range = format!("{from}..{to}");
        let format = format!("--format={}", commit::LOG_FORMAT);
        let output = self.run_output(&[
            "log",
            "--reverse",
            "--first-parent",
            "--ancestry-path",
            "--date=raw",
            &format,
            &range,
        ])?;
        Ok(CommitRecord::parse_log(&output)?)
    }

    /// Create a commit object for `tree` with the given parents and message,
    /// returning the new hash.
    ///
    /// The author identity is always taken from `author`; the committer is
    /// taken from `committer` when given, otherwise git fills in the current
    /// actor and time. Identity overrides are scoped to this one call.
    pub fn commit_tree(
        &self,
        tree: &str,
        parents: &[String],
        message: &str,
        author: &Identity,
        committer: Option<&Identity>,
    ) -> Result<String, Error> {
        let mut command = Command::new("git");
        command.arg("commit-tree").arg(tree);
        for parent in parents {
            command.args(["-p", parent]);
        }
        command
            .env("GIT_AUTHOR_NAME", &author.name)
            .env("GIT_AUTHOR_EMAIL", &author.email)
            .env("GIT_AUTHOR_DATE", &author.date);
        if let Some(committer) = committer {
            command
                .env("GIT_COMMITTER_NAME", &committer.name)
                .env("GIT_COMMITTER_EMAIL", &committer.email)
                .env("GIT_COMMITTER_DATE", &committer.date);
        }
        command
            .current_dir(&self.root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| Error::Exec(format!("git commit-tree: {e}")))?;
        child
            .stdin
            .take()
            .ok_or_else(|| Error::Exec("git commit-tree: no stdin".to_string()))?
            .write_all(message.as_bytes())
            .map_err(|e| Error::Exec(format!("git commit-tree: {e}")))?;
        let output = child
            .wait_with_output()
            .map_err(|e| Error::Exec(format!("git commit-tree: {e}")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(Error::Failed {
                command: format!("git commit-tree {tree}"),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    /// Move `refname` from `old` to `new`, recording `log_message` in the
    /// reflog. Fails if the ref no longer points at `old`.
    pub fn update_ref(
        &self,
        refname: &str,
        new: &str,
        old: &str,
        log_message: &str,
    ) -> Result<(), Error> {
        self.run_output(&["update-ref", "-m", log_message, refname, new, old])?;
        Ok(())
    }

    /// Run a git command and capture its stdout, surfacing stderr on failure.
    fn run_output(&self, args: &[&str]) -> Result<String, Error> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::Exec(format!("git {}: {e}", args.first().unwrap_or(&""))))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(Error::Failed {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Errors from git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to execute: {0}")]
    Exec(String),

    #[error("not a git repository (searched from '{0}')")]
    NotARepo(String),

    #[error("'{0}' does not name a commit")]
    BadRevision(String),

    #[error("{command} failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("unreadable log output")]
    Parse(#[from] commit::ParseError),
}
