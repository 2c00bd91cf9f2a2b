//! Commit metadata as read from the repository.
//!
//! A range is read in one `git log` call using a field-delimited record
//! format: fields are separated by the unit separator byte (`%x1f`), which
//! git never emits inside a field, and each record ends with an explicit
//! NUL (`%x00`). The message is always the last field so its embedded
//! newlines survive.

/// The `--format` string matching [`CommitRecord::parse`], field for field.
///
/// Dates use `--date=raw` so the values round-trip through
/// `GIT_AUTHOR_DATE` / `GIT_COMMITTER_DATE` without reformatting.
pub const LOG_FORMAT: &str =
    "%H%x1f%T%x1f%P%x1f%an%x1f%ae%x1f%ad%x1f%cn%x1f%ce%x1f%cd%x1f%B%x00";

const FIELD_SEP: char = '\x1f';
const FIELD_COUNT: usize = 10;

/// A name/email pair with its raw timestamp (`<epoch> <offset>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub date: String,
}

/// One commit as read from the log, immutable once parsed.
///
/// `parents[0]` is the mainline (first) parent; any further entries are the
/// merge parents the rewrite either strips or restores.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub hash: String,
    pub tree: String,
    pub parents: Vec<String>,
    pub author: Identity,
    pub committer: Identity,
    pub message: String,
}

impl CommitRecord {
    /// Parse a single record produced by [`LOG_FORMAT`].
    pub fn parse(record: &str) -> Result<Self, ParseError> {
        let mut fields = record.splitn(FIELD_COUNT, FIELD_SEP);
        let mut next = |name: &'static str| {
            fields.next().ok_or(ParseError::MissingField { name })
        };

        let hash = next("hash")?.to_string();
        let tree = next("tree")?.to_string();
        let parents = next("parents")?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let author = Identity {
            name: next("author name")?.to_string(),
            email: next("author email")?.to_string(),
            date: next("author date")?.to_string(),
        };
        let committer = Identity {
            name: next("committer name")?.to_string(),
            email: next("committer email")?.to_string(),
            date: next("committer date")?.to_string(),
        };
        let message = next("message")?.to_string();

        Ok(Self {
            hash,
            tree,
            parents,
            author,
            committer,
            message,
        })
    }

    /// Parse the full output of a range read: NUL-terminated records, with
    /// the stray newline git prints between format entries stripped.
    pub fn parse_log(output: &str) -> Result<Vec<Self>, ParseError> {
        output
            .split('\0')
            .map(|record| record.trim_start_matches('\n'))
            .filter(|record| !record.is_empty())
            .map(Self::parse)
            .collect()
    }
}

/// Errors from decoding a log record.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("log record is missing the {name} field")]
    MissingField { name: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(parents: &str, message: &str) -> String {
        [
            "aaaa1111",
            "tttt2222",
            parents,
            "Ada Lovelace",
            "ada@example.com",
            "1700000000 +0100",
            "Charles Babbage",
            "charles@example.com",
            "1700000100 +0000",
            message,
        ]
        .join("\x1f")
    }

    #[test]
    fn parses_all_fields() {
        let rec = CommitRecord::parse(&record("p1 p2", "subject\n\nbody\n")).unwrap();
        assert_eq!(rec.hash, "aaaa1111");
        assert_eq!(rec.tree, "tttt2222");
        assert_eq!(rec.parents, vec!["p1", "p2"]);
        assert_eq!(rec.author.name, "Ada Lovelace");
        assert_eq!(rec.author.date, "1700000000 +0100");
        assert_eq!(rec.committer.email, "charles@example.com");
        assert_eq!(rec.message, "subject\n\nbody\n");
    }

    #[test]
    fn message_keeps_embedded_separator_lookalikes() {
        // Newlines in the message must never split the record.
        let rec = CommitRecord::parse(&record("p1", "a\nb\nc\n")).unwrap();
        assert_eq!(rec.message, "a\nb\nc\n");
    }

    #[test]
    fn root_commit_has_no_parents() {
        let rec = CommitRecord::parse(&record("", "init\n")).unwrap();
        assert!(rec.parents.is_empty());
    }

    #[test]
    fn splits_nul_terminated_records() {
        let output = format!("{}\0\n{}\0\n", record("p1", "one\n"), record("p1 p2", "two\n"));
        let records = CommitRecord::parse_log(&output).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "one\n");
        assert_eq!(records[1].parents.len(), 2);
    }

    #[test]
    fn truncated_record_is_an_error() {
        assert!(CommitRecord::parse("aaaa\x1ftttt").is_err());
    }
}
