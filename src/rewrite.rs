//! The rewrite run: read a range, transform each commit, rebuild the chain,
//! move the branch.
//!
//! Strictly sequential: every rebuilt commit's mainline parent is the hash
//! produced for its predecessor, so each commit must be fully rebuilt before
//! the next one starts. The ref update is the last step; any failure before
//! it leaves the branch untouched. Rebuilt commits orphaned by an aborted
//! run stay unreachable until git prunes them.

use tracing::{debug, info};

use crate::git::{self, Git};
use crate::transform::{self, Direction};

/// Knobs for a rewrite run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Branch to rewrite instead of the currently checked-out one.
    pub branch: Option<String>,
    /// Report the would-be new tip instead of moving the ref.
    pub dry_run: bool,
    /// Reuse each source commit's committer identity and date.
    pub keep_committer: bool,
}

/// What a successful run did.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The ref was moved to the new chain tip.
    Updated {
        refname: String,
        old_tip: String,
        new_tip: String,
        commits: usize,
    },
    /// Dry run: the new chain exists but no ref was touched.
    DryRun { new_tip: String, commits: usize },
}

/// Rewrite the first-parent range from `upstream` (exclusive) to the target
/// branch tip, in the given direction.
pub fn run(
    git: &Git,
    direction: Direction,
    upstream: &str,
    options: &Options,
) -> Result<Outcome, Error> {
    let base = resolve(git, upstream)?;
    let refname = target_ref(git, options)?;
    let old_tip = resolve(git, &refname)?;

    let records = git.read_range(&base, &old_tip).map_err(Error::Read)?;
    if records.is_empty() {
        return Err(Error::EmptyRange {
            base,
            tip: old_tip,
        });
    }
    info!(
        %refname,
        %base,
        tip = %old_tip,
        commits = records.len(),
        "rewriting range ({})",
        direction.as_str()
    );

    // Rebuild the chain oldest first. The first commit keeps the original
    // pre-range ancestor as its mainline parent; everyone after hangs off
    // the hash just produced.
    let mut previous = base.clone();
    for record in &records {
        let transformed = transform::apply(direction, record);
        let mut parents = Vec::with_capacity(1 + transformed.extra_parents.len());
        parents.push(previous);
        parents.extend(transformed.extra_parents);

        let committer = options.keep_committer.then_some(&record.committer);
        let new_hash = git
            .commit_tree(
                &record.tree,
                &parents,
                &transformed.message,
                &record.author,
                committer,
            )
            .map_err(|source| Error::Write {
                hash: record.hash.clone(),
                source,
            })?;
        debug!(old = %record.hash, new = %new_hash, parents = parents.len(), "rebuilt commit");
        previous = new_hash;
    }
    let new_tip = previous;

    if options.dry_run {
        info!(%new_tip, "dry run, leaving {refname} alone");
        return Ok(Outcome::DryRun {
            new_tip,
            commits: records.len(),
        });
    }

    let log_message = format!("{}: {}..{}", direction.as_str(), upstream, refname);
    if let Err(source) = git.update_ref(&refname, &new_tip, &old_tip, &log_message) {
        // Distinguish a ref somebody else moved mid-run from an ordinary
        // write failure.
        if let Ok(actual) = git.rev_parse(&refname) {
            if actual != old_tip {
                return Err(Error::RefMoved {
                    refname,
                    expected: old_tip,
                    actual,
                });
            }
        }
        return Err(Error::Update { refname, source });
    }
    info!(%refname, %new_tip, "updated ref");

    Ok(Outcome::Updated {
        refname,
        old_tip,
        new_tip,
        commits: records.len(),
    })
}

/// Resolve a revision, folding an unknown name into [`Error::InvalidReference`].
fn resolve(git: &Git, rev: &str) -> Result<String, Error> {
    match git.rev_parse(rev) {
        Ok(hash) => Ok(hash),
        Err(git::Error::BadRevision(rev)) => Err(Error::InvalidReference(rev)),
        Err(e) => Err(Error::Read(e)),
    }
}

/// The ref the run will rewrite: the `--branch` override, the checked-out
/// branch, or HEAD itself when detached.
fn target_ref(git: &Git, options: &Options) -> Result<String, Error> {
    match &options.branch {
        Some(branch) if branch.starts_with("refs/") => Ok(branch.clone()),
        Some(branch) => Ok(format!("refs/heads/{branch}")),
        None => Ok(git
            .current_branch()
            .map_err(Error::Read)?
            .unwrap_or_else(|| "HEAD".to_string())),
    }
}

/// Errors that can end a rewrite run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{0}' does not resolve to a commit")]
    InvalidReference(String),

    #[error("no commits on the first-parent path from {base} to {tip}")]
    EmptyRange { base: String, tip: String },

    #[error("failed to read history")]
    Read(#[source] git::Error),

    #[error("failed to rebuild commit {hash}")]
    Write {
        hash: String,
        #[source]
        source: git::Error,
    },

    #[error("{refname} moved during the rewrite: expected {expected}, found {actual}")]
    RefMoved {
        refname: String,
        expected: String,
        actual: String,
    },

    #[error("failed to update {refname}")]
    Update {
        refname: String,
        #[source]
        source: git::Error,
    },
}
