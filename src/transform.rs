//! The bidirectional message/parent transform.
//!
//! Merge parents are encoded as `[merge: <hash>]` lines appended to the
//! commit message, one per dropped parent, in their original order. The
//! reverse direction scans for exactly that shape, collects the hashes, and
//! removes the lines. Everything here is pure; the rewrite loop decides the
//! mainline parent.
//!
//! A pre-existing message line that happens to match the tag shape will be
//! misread as a merge parent on the way back. Known limitation.

use crate::commit::CommitRecord;

const TAG_PREFIX: &str = "[merge: ";
const TAG_SUFFIX: &str = "]";

/// Which way the history is being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `remove-merges`: drop merge parents, record them in the message.
    Remove,
    /// `unremove-merges`: re-read recorded parents out of the message.
    Restore,
}

impl Direction {
    /// The subcommand name, used for logs and reflog messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Remove => "remove-merges",
            Direction::Restore => "unremove-merges",
        }
    }
}

/// Engine output for one commit: the parents to add after the mainline
/// parent, and the rewritten message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub extra_parents: Vec<String>,
    pub message: String,
}

/// Apply the transform for `direction` to a single commit.
pub fn apply(direction: Direction, record: &CommitRecord) -> Transformed {
    match direction {
        Direction::Remove => strip(record),
        Direction::Restore => restore(record),
    }
}

/// Drop every merge parent, appending one tag line per dropped parent.
///
/// Ordinary single-parent commits pass through with the message untouched.
/// The tag block is separated from the message by one blank line, added only
/// if the message does not already end in one.
pub fn strip(record: &CommitRecord) -> Transformed {
    let dropped = match record.parents.len() {
        0 | 1 => {
            return Transformed {
                extra_parents: Vec::new(),
                message: record.message.clone(),
            };
        }
        _ => &record.parents[1..],
    };

    let mut message = record.message.clone();
    if !message.is_empty() && !message.ends_with('\n') {
        message.push('\n');
    }
    if !message.is_empty() && !message.ends_with("\n\n") {
        message.push('\n');
    }
    for parent in dropped {
        message.push_str(TAG_PREFIX);
        message.push_str(parent);
        message.push_str(TAG_SUFFIX);
        message.push('\n');
    }

    Transformed {
        extra_parents: Vec::new(),
        message,
    }
}

/// Collect tagged merge parents out of the message, in order of appearance,
/// and remove the tag lines.
///
/// Parents the input commit already carries beyond the mainline are kept
/// ahead of the recovered ones. Trailing blank lines that held only the tag
/// block are trimmed so a strip/restore round trip reproduces the original
/// message.
pub fn restore(record: &CommitRecord) -> Transformed {
    let mut extra_parents: Vec<String> =
        record.parents.iter().skip(1).cloned().collect();
    let mut kept: Vec<&str> = Vec::new();
    let mut found_tag = false;

    for line in record.message.split_inclusive('\n') {
        match parse_tag(line) {
            Some(hash) => {
                extra_parents.push(hash.to_string());
                found_tag = true;
            }
            None => kept.push(line),
        }
    }

    let mut message: String = kept.concat();
    if found_tag {
        while message.ends_with("\n\n") {
            message.pop();
        }
    }

    Transformed {
        extra_parents,
        message,
    }
}

/// Recognize a `[merge: <hex>]` line, returning the hash.
fn parse_tag(line: &str) -> Option<&str> {
    let line = line.trim();
    let hash = line.strip_prefix(TAG_PREFIX)?.strip_suffix(TAG_SUFFIX)?;
    let hash = hash.trim();
    if !hash.is_empty() && hash.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hash)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::Identity;

    fn commit(parents: &[&str], message: &str) -> CommitRecord {
        let identity = Identity {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            date: "1700000000 +0000".into(),
        };
        CommitRecord {
            hash: "c0ffee".into(),
            tree: "7ea7ea".into(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
            author: identity.clone(),
            committer: identity,
            message: message.into(),
        }
    }

    #[test]
    fn strip_is_identity_for_single_parent() {
        let out = strip(&commit(&["p1"], "subject\n\nbody\n"));
        assert!(out.extra_parents.is_empty());
        assert_eq!(out.message, "subject\n\nbody\n");
    }

    #[test]
    fn strip_appends_tag_after_blank_separator() {
        let out = strip(&commit(&["p1", "abc123"], "merge it\n"));
        assert_eq!(out.message, "merge it\n\n[merge: abc123]\n");
        assert!(out.extra_parents.is_empty());
    }

    #[test]
    fn strip_keeps_existing_trailing_blank_line() {
        let out = strip(&commit(&["p1", "abc123"], "merge it\n\n"));
        assert_eq!(out.message, "merge it\n\n[merge: abc123]\n");
    }

    #[test]
    fn strip_records_octopus_parents_in_order() {
        let out = strip(&commit(&["p1", "aaa111", "bbb222"], "octopus\n"));
        assert_eq!(
            out.message,
            "octopus\n\n[merge: aaa111]\n[merge: bbb222]\n"
        );
    }

    #[test]
    fn restore_recovers_parents_in_order_of_appearance() {
        let out = restore(&commit(
            &["p1"],
            "octopus\n\n[merge: aaa111]\n[merge: bbb222]\n",
        ));
        assert_eq!(out.extra_parents, vec!["aaa111", "bbb222"]);
        assert_eq!(out.message, "octopus\n");
    }

    #[test]
    fn restore_accepts_tags_anywhere_in_the_body() {
        let out = restore(&commit(
            &["p1"],
            "subject\n\n[merge: abc123]\n\ntrailing body\n",
        ));
        assert_eq!(out.extra_parents, vec!["abc123"]);
        assert_eq!(out.message, "subject\n\n\ntrailing body\n");
    }

    #[test]
    fn restore_ignores_lookalike_lines() {
        let msg = "see [merge: abc123] inline\n[merge: not-hex]\n[merge: ]\n";
        let out = restore(&commit(&["p1"], msg));
        assert!(out.extra_parents.is_empty());
        assert_eq!(out.message, msg);
    }

    #[test]
    fn restore_tolerates_surrounding_whitespace_and_hex_case() {
        let out = restore(&commit(&["p1"], "m\n\n  [merge: ABCdef]  \n"));
        assert_eq!(out.extra_parents, vec!["ABCdef"]);
    }

    #[test]
    fn restore_without_tags_is_identity() {
        let out = restore(&commit(&["p1"], "plain\n\nbody\n"));
        assert!(out.extra_parents.is_empty());
        assert_eq!(out.message, "plain\n\nbody\n");
    }

    #[test]
    fn restore_keeps_preexisting_extra_parents_first() {
        let out = restore(&commit(&["p1", "p2"], "m\n\n[merge: abc123]\n"));
        assert_eq!(out.extra_parents, vec!["p2", "abc123"]);
    }

    #[test]
    fn round_trip_reproduces_message_and_parents() {
        for message in ["merge x\n", "merge x\n\nlong body\nmore\n", "merge x"] {
            let original = commit(&["p1", "aaa111", "bbb222"], message);
            let stripped = strip(&original);

            let mut as_read = original.clone();
            as_read.parents = vec!["p1".into()];
            as_read.message = stripped.message;

            let restored = restore(&as_read);
            assert_eq!(restored.extra_parents, vec!["aaa111", "bbb222"]);
            let want = if message.ends_with('\n') {
                message.to_string()
            } else {
                format!("{message}\n")
            };
            assert_eq!(restored.message, want);
        }
    }
}
