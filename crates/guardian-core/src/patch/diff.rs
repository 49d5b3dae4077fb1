//! Myers line diff and unified-diff rendering.

use std::fmt::Write as _;
use std::ops::{Index, IndexMut, Range};

pub const ORIGINAL_LABEL: &str = "original";
pub const MODIFIED_LABEL: &str = "modified";
const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    Equal,
    Delete,
    Insert,
}

/// One step of an edit script. `old`/`new` are 0-based line positions; for
/// an insert `old` is the position in the original the line goes before,
/// and for a delete `new` is the matching position in the modified text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edit {
    pub kind: EditKind,
    pub old: usize,
    pub new: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<String>,
}

impl DiffHunk {
    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            format_range(self.old_start, self.old_len),
            format_range(self.new_start, self.new_len)
        )
    }
}

/// `start` is 0-based; ranges of length 1 omit the count and empty ranges
/// point at the line before.
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

/// Shortest edit script between `a` and `b`.
///
/// Linear-space Myers: the middle snake of each subproblem splits it in two,
/// so memory stays O(N+M) while time is O((N+M)D). Within each run of
/// changes, deletions come before insertions.
pub fn myers_diff<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Edit> {
    let max_d = max_d(a.len(), b.len());
    let mut vf = Diagonals::new(max_d);
    let mut vb = Diagonals::new(max_d);
    let mut kinds = Vec::with_capacity(a.len().max(b.len()));
    conquer(a, 0..a.len(), b, 0..b.len(), &mut vf, &mut vb, &mut kinds);
    number_edits(kinds)
}

/// Furthest-reaching x per diagonal `k`, indexed by `k` in `-max_d..max_d`.
struct Diagonals {
    offset: isize,
    v: Vec<usize>,
}

impl Diagonals {
    fn new(max_d: usize) -> Self {
        Self {
            offset: max_d as isize,
            v: vec![0; 2 * max_d + 1],
        }
    }
}

impl Index<isize> for Diagonals {
    type Output = usize;

    fn index(&self, k: isize) -> &usize {
        &self.v[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for Diagonals {
    fn index_mut(&mut self, k: isize) -> &mut usize {
        &mut self.v[(k + self.offset) as usize]
    }
}

fn max_d(n: usize, m: usize) -> usize {
    (n + m + 1) / 2 + 1
}

fn common_prefix_len<T: PartialEq>(a: &[T], a_range: Range<usize>, b: &[T], b_range: Range<usize>) -> usize {
    a[a_range]
        .iter()
        .zip(&b[b_range])
        .take_while(|(x, y)| x == y)
        .count()
}

fn common_suffix_len<T: PartialEq>(a: &[T], a_range: Range<usize>, b: &[T], b_range: Range<usize>) -> usize {
    a[a_range]
        .iter()
        .rev()
        .zip(b[b_range].iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Point where a shortest path through `a_range` x `b_range` crosses its
/// middle snake, in absolute coordinates.
fn middle_snake<T: PartialEq>(
    a: &[T],
    a_range: Range<usize>,
    b: &[T],
    b_range: Range<usize>,
    vf: &mut Diagonals,
    vb: &mut Diagonals,
) -> Option<(usize, usize)> {
    let n = a_range.len();
    let m = b_range.len();
    let delta = n as isize - m as isize;
    let odd = delta & 1 == 1;
    vf[1] = 0;
    vb[1] = 0;

    for d in 0..max_d(n, m) as isize {
        let mut k = d;
        while k >= -d {
            let mut x = if k == -d || (k != d && vf[k - 1] < vf[k + 1]) {
                vf[k + 1]
            } else {
                vf[k - 1] + 1
            };
            let y = (x as isize - k) as usize;
            let (x0, y0) = (x, y);
            if x < n && y < m {
                x += common_prefix_len(a, a_range.start + x..a_range.end, b, b_range.start + y..b_range.end);
            }
            vf[k] = x;
            if odd && (k - delta).abs() < d && vf[k] + vb[-(k - delta)] >= n {
                return Some((a_range.start + x0, b_range.start + y0));
            }
            k -= 2;
        }

        let mut k = d;
        while k >= -d {
            let mut x = if k == -d || (k != d && vb[k - 1] < vb[k + 1]) {
                vb[k + 1]
            } else {
                vb[k - 1] + 1
            };
            let mut y = (x as isize - k) as usize;
            if x < n && y < m {
                let snake = common_suffix_len(
                    a,
                    a_range.start..a_range.start + n - x,
                    b,
                    b_range.start..b_range.start + m - y,
                );
                x += snake;
                y += snake;
            }
            vb[k] = x;
            if !odd && (k - delta).abs() <= d && vb[k] + vf[-(k - delta)] >= n {
                return Some((a_range.start + n - x, b_range.start + m - y));
            }
            k -= 2;
        }
    }
    None
}

fn conquer<T: PartialEq>(
    a: &[T],
    mut a_range: Range<usize>,
    b: &[T],
    mut b_range: Range<usize>,
    vf: &mut Diagonals,
    vb: &mut Diagonals,
    out: &mut Vec<EditKind>,
) {
    let prefix = common_prefix_len(a, a_range.clone(), b, b_range.clone());
    out.extend(std::iter::repeat(EditKind::Equal).take(prefix));
    a_range.start += prefix;
    b_range.start += prefix;

    let suffix = common_suffix_len(a, a_range.clone(), b, b_range.clone());
    a_range.end -= suffix;
    b_range.end -= suffix;

    if a_range.is_empty() || b_range.is_empty() {
        out.extend(std::iter::repeat(EditKind::Delete).take(a_range.len()));
        out.extend(std::iter::repeat(EditKind::Insert).take(b_range.len()));
    } else if let Some((x, y)) = middle_snake(a, a_range.clone(), b, b_range.clone(), vf, vb) {
        conquer(a, a_range.start..x, b, b_range.start..y, vf, vb, out);
        conquer(a, x..a_range.end, b, y..b_range.end, vf, vb, out);
    } else {
        out.extend(std::iter::repeat(EditKind::Delete).take(a_range.len()));
        out.extend(std::iter::repeat(EditKind::Insert).take(b_range.len()));
    }

    out.extend(std::iter::repeat(EditKind::Equal).take(suffix));
}

/// Assign positions, moving deletions ahead of insertions within each run
/// of changes.
fn number_edits(kinds: Vec<EditKind>) -> Vec<Edit> {
    let mut edits = Vec::with_capacity(kinds.len());
    let (mut old, mut new) = (0usize, 0usize);
    let mut i = 0;
    while i < kinds.len() {
        if kinds[i] == EditKind::Equal {
            edits.push(Edit {
                kind: EditKind::Equal,
                old,
                new,
            });
            old += 1;
            new += 1;
            i += 1;
            continue;
        }
        let run_end = kinds[i..]
            .iter()
            .position(|k| *k == EditKind::Equal)
            .map_or(kinds.len(), |p| i + p);
        let deletes = kinds[i..run_end].iter().filter(|k| **k == EditKind::Delete).count();
        let inserts = run_end - i - deletes;
        for d in 0..deletes {
            edits.push(Edit {
                kind: EditKind::Delete,
                old: old + d,
                new,
            });
        }
        for n in 0..inserts {
            edits.push(Edit {
                kind: EditKind::Insert,
                old: old + deletes,
                new: new + n,
            });
        }
        old += deletes;
        new += inserts;
        i = run_end;
    }
    edits
}

/// Group an edit script into hunks with `context` unchanged lines around
/// each change. Hunks whose context would overlap are merged.
pub fn build_hunks(edits: &[Edit], old: &[&str], new: &[&str], context: usize) -> Vec<DiffHunk> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (i, edit) in edits.iter().enumerate() {
        if edit.kind == EditKind::Equal {
            continue;
        }
        let start = i.saturating_sub(context);
        let end = (i + context + 1).min(edits.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }

    ranges
        .into_iter()
        .map(|(start, end)| {
            let slice = &edits[start..end];
            let mut lines = Vec::with_capacity(slice.len());
            let (mut old_len, mut new_len) = (0, 0);
            for edit in slice {
                let (prefix, text) = match edit.kind {
                    EditKind::Equal => {
                        old_len += 1;
                        new_len += 1;
                        (' ', old[edit.old])
                    }
                    EditKind::Delete => {
                        old_len += 1;
                        ('-', old[edit.old])
                    }
                    EditKind::Insert => {
                        new_len += 1;
                        ('+', new[edit.new])
                    }
                };
                lines.push(format!("{prefix}{text}"));
            }
            DiffHunk {
                old_start: slice[0].old,
                old_len,
                new_start: slice[0].new,
                new_len,
                lines,
            }
        })
        .collect()
}

/// Render a unified diff. Returns an empty string when the texts are equal.
///
/// Lines are compared with their line terminators, so a missing final
/// newline shows up as a change and is marked the way `diff -u` marks it.
pub fn unified_diff(original: &str, modified: &str, context: usize) -> String {
    let old: Vec<&str> = original.split_inclusive('\n').collect();
    let new: Vec<&str> = modified.split_inclusive('\n').collect();
    let edits = myers_diff(&old, &new);
    let hunks = build_hunks(&edits, &old, &new, context);
    if hunks.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let _ = writeln!(out, "--- {ORIGINAL_LABEL}");
    let _ = writeln!(out, "+++ {MODIFIED_LABEL}");
    for hunk in &hunks {
        let _ = writeln!(out, "{}", hunk.header());
        for line in &hunk.lines {
            match line.strip_suffix('\n') {
                Some(body) => {
                    let _ = writeln!(out, "{body}");
                }
                None => {
                    let _ = writeln!(out, "{line}");
                    let _ = writeln!(out, "{NO_NEWLINE_MARKER}");
                }
            }
        }
    }
    out
}
