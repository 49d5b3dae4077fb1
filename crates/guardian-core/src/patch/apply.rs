//! Heuristic patch application.

use tracing::debug;

use crate::errors::{GuardianError, GuardianResult};
use crate::models::{short_hash, Patch};
use crate::patch::{classify_lines, DiffLine};

/// Apply `patch` to `base`, best effort.
///
/// This is not a positional patch algorithm. Hunk positions and context are
/// ignored; every added line is appended to the end of the output, and every
/// removed line deletes the first exactly-matching line, if any. Applying a
/// generated patch reproduces the modified text only for edits that are
/// whole-line appends or deletions at the end of the unit. Callers must
/// validate the result before trusting it.
///
/// Output lines use `\r\n` when the base does, `\n` otherwise.
///
/// Fails when the patch id does not match its diff text, or when the diff
/// contains a line that is not a header, hunk marker, context, addition or
/// removal.
pub fn apply_patch(base: &str, patch: &Patch) -> GuardianResult<String> {
    if patch.is_empty() {
        return Ok(base.to_string());
    }
    let expected = short_hash(&patch.diff_text);
    if expected != patch.id {
        return Err(GuardianError::Patch(format!(
            "patch id {} does not match diff content ({expected})",
            patch.id
        )));
    }

    let mut output: Vec<String> = base.lines().map(str::to_string).collect();
    let (mut appended, mut removed, mut unmatched) = (0usize, 0usize, 0usize);

    for (idx, line) in classify_lines(&patch.diff_text).into_iter().enumerate() {
        match line {
            DiffLine::Added(text) => {
                output.push(text.to_string());
                appended += 1;
            }
            DiffLine::Removed(text) => match output.iter().position(|l| l == text) {
                Some(pos) => {
                    output.remove(pos);
                    removed += 1;
                }
                None => unmatched += 1,
            },
            DiffLine::Unknown => {
                return Err(GuardianError::Patch(format!(
                    "malformed diff line {}",
                    idx + 1
                )));
            }
            DiffLine::Header
            | DiffLine::HunkMarker
            | DiffLine::Context
            | DiffLine::NoNewlineMarker => {}
        }
    }

    debug!(
        patch_id = %patch.id,
        appended,
        removed,
        unmatched,
        "heuristic patch applied"
    );

    let newline = if base.contains("\r\n") { "\r\n" } else { "\n" };
    let mut result = output.join(newline);
    if !output.is_empty() && (base.is_empty() || base.ends_with('\n')) {
        result.push_str(newline);
    }
    Ok(result)
}
