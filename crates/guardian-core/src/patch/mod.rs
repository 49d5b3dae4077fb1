//! Patch generation and heuristic re-application.
//!
//! Patches are unified diffs addressed by the hash of their own text. The
//! applier is deliberately approximate; see [`apply::apply_patch`].

pub mod apply;
pub mod diff;

pub use apply::apply_patch;
pub use diff::{unified_diff, DiffHunk};

use crate::config::DEFAULT_DIFF_CONTEXT;
use crate::models::{short_hash, unix_timestamp, Patch};

/// Classification of one line of a unified diff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DiffLine<'a> {
    Header,
    HunkMarker,
    Context,
    Added(&'a str),
    Removed(&'a str),
    NoNewlineMarker,
    Unknown,
}

/// Classify every line of `diff_text`. `---`/`+++` lines count as headers
/// only before the first hunk marker, so removed/added content that itself
/// starts with `--`/`++` is not mistaken for a header.
pub(crate) fn classify_lines(diff_text: &str) -> Vec<DiffLine<'_>> {
    let mut in_header = true;
    diff_text
        .lines()
        .map(|line| {
            if line.starts_with("@@") {
                in_header = false;
                return DiffLine::HunkMarker;
            }
            if in_header && (line.starts_with("--- ") || line.starts_with("+++ ")) {
                return DiffLine::Header;
            }
            match line.as_bytes().first() {
                None | Some(b' ') => DiffLine::Context,
                Some(b'+') => DiffLine::Added(&line[1..]),
                Some(b'-') => DiffLine::Removed(&line[1..]),
                Some(b'\\') => DiffLine::NoNewlineMarker,
                Some(_) => DiffLine::Unknown,
            }
        })
        .collect()
}

pub fn generate_patch(original: &str, modified: &str) -> Patch {
    generate_patch_with_context(original, modified, DEFAULT_DIFF_CONTEXT)
}

pub fn generate_patch_with_context(original: &str, modified: &str, context: usize) -> Patch {
    let diff_text = unified_diff(original, modified, context);
    let (mut lines_added, mut lines_removed) = (0, 0);
    for line in classify_lines(&diff_text) {
        match line {
            DiffLine::Added(_) => lines_added += 1,
            DiffLine::Removed(_) => lines_removed += 1,
            _ => {}
        }
    }
    Patch {
        id: short_hash(&diff_text),
        timestamp: unix_timestamp(),
        diff_text,
        lines_added,
        lines_removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_patch_counts() {
        let patch = generate_patch("a\nb\nc\n", "a\nB\nc\nd\n");
        assert_eq!(patch.lines_added, 2);
        assert_eq!(patch.lines_removed, 1);
        assert!(patch.diff_text.starts_with("--- original\n+++ modified\n"));
    }

    #[test]
    fn test_patch_id_is_content_addressed() {
        let first = generate_patch("a\nb\n", "a\nc\n");
        let second = generate_patch("a\nb\n", "a\nc\n");
        assert_eq!(first.id, second.id);
        assert_eq!(first.id, short_hash(&first.diff_text));

        let other = generate_patch("a\nb\n", "a\nd\n");
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn test_patch_id_independent_of_input_identity() {
        // Same diff text from different surrounding inputs.
        let one = generate_patch_with_context("x\na\n", "x\nb\n", 0);
        let two = generate_patch_with_context("y\na\n", "y\nb\n", 0);
        assert_eq!(one.diff_text, two.diff_text);
        assert_eq!(one.id, two.id);
    }

    #[test]
    fn test_identical_texts_give_empty_patch() {
        let patch = generate_patch("same\n", "same\n");
        assert!(patch.is_empty());
        assert_eq!(patch.lines_added, 0);
        assert_eq!(patch.lines_removed, 0);
    }

    #[test]
    fn test_full_rewrite_of_large_unit() {
        let original: String = (0..4000).map(|i| format!("old_{i} = {i}\n")).collect();
        let modified: String = (0..4000).map(|i| format!("new_{i} = {i}\n")).collect();
        let patch = generate_patch(&original, &modified);
        assert_eq!(patch.lines_added, 4000);
        assert_eq!(patch.lines_removed, 4000);
        assert!(patch.diff_text.contains("@@ -1,4000 +1,4000 @@\n"));
    }

    #[test]
    fn test_content_lines_that_look_like_headers() {
        let patch = generate_patch("-- sql comment\n", "++counter;\n");
        assert_eq!(patch.lines_removed, 1);
        assert_eq!(patch.lines_added, 1);
    }

    #[test]
    fn test_classify_lines() {
        let lines = classify_lines("--- original\n+++ modified\n@@ -1 +1 @@\n-a\n+b\n c\n\\ No newline at end of file\n?\n");
        assert_eq!(
            lines,
            vec![
                DiffLine::Header,
                DiffLine::Header,
                DiffLine::HunkMarker,
                DiffLine::Removed("a"),
                DiffLine::Added("b"),
                DiffLine::Context,
                DiffLine::NoNewlineMarker,
                DiffLine::Unknown,
            ]
        );
    }
}
