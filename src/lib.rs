//! demerge: flatten merge commits into a linear history, and put them back.
//!
//! `remove-merges` rewrites a first-parent range so every commit has exactly
//! one parent, recording each dropped merge parent as a `[merge: <hash>]`
//! line in the commit message. `unremove-merges` reads those lines back into
//! real parents. Only commit metadata is rewritten; trees, the working tree,
//! and the index are never touched.
//!
//! # Architecture
//!
//! - **Git**: backend access through the `git` binary (read ranges, create
//!   commits, move refs)
//! - **Commit**: the per-commit metadata model and log-record parser
//! - **Transform**: the pure strip/restore message and parent transform
//! - **Rewrite**: the sequential run that chains rebuilt commits together
//!   and repoints the branch

mod commit;
mod git;
mod rewrite;
mod transform;

pub use commit::{CommitRecord, Identity};
pub use git::{Error as GitError, Git};
pub use rewrite::{run, Error, Options, Outcome};
pub use transform::Direction;
