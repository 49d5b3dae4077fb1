//! Best-effort textual repair.
//!
//! Both passes are unsound heuristics meant as optional pre-processing. The
//! default analysis path never runs them; callers that do should re-run the
//! test executor on the result before trusting it.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

pub const TAB_WIDTH: usize = 4;
const MAX_BLANK_RUN: usize = 2;

static TOP_LEVEL_SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:async\s+)?(?:def|class)\s+([A-Za-z_][A-Za-z0-9_]*)\s*(\([^)]*\))?").unwrap()
});

/// Strip stray control characters, expand tabs and close brackets left open
/// on a single line.
///
/// Bracket balancing is line-local: a line ending in `:`, `,` or an opening
/// bracket is treated as a continuation and left alone, but a multi-line
/// construct opened mid-line will be closed early.
pub fn heal_syntax(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|&c| c >= ' ' || matches!(c, '\n' | '\t' | '\r'))
        .collect();
    let expanded = cleaned.replace('\t', &" ".repeat(TAB_WIDTH));

    let mut closed = 0usize;
    let healed: Vec<String> = expanded
        .split('\n')
        .map(|line| {
            let (body, cr) = match line.strip_suffix('\r') {
                Some(body) => (body, "\r"),
                None => (line, ""),
            };
            let closers = missing_closers(body);
            if closers.is_empty() {
                line.to_string()
            } else {
                closed += closers.len();
                format!("{body}{closers}{cr}")
            }
        })
        .collect();

    if closed > 0 {
        debug!(closed, "heal_syntax appended closers");
    }
    healed.join("\n")
}

fn missing_closers(line: &str) -> String {
    let trimmed = line.trim_end();
    if trimmed.is_empty() || trimmed.ends_with([':', ',', '(', '[', '{']) {
        return String::new();
    }
    let mut open: Vec<char> = Vec::new();
    for c in trimmed.chars() {
        match c {
            '(' | '[' | '{' => open.push(c),
            ')' | ']' | '}' => {
                if open.last().copied() == Some(opener_for(c)) {
                    open.pop();
                }
            }
            _ => {}
        }
    }
    open.iter().rev().map(|&c| closer_for(c)).collect()
}

fn opener_for(closer: char) -> char {
    match closer {
        ')' => '(',
        ']' => '[',
        _ => '{',
    }
}

fn closer_for(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Drop repeated top-level declarations and collapse long blank runs.
///
/// A declaration repeats when its signature (keyword, name and parameter
/// list, joined across lines when it spans several) was already seen. The
/// repeat and every indented, comment or blank line after it are skipped, so
/// the first definition wins. A declaration whose parameter list never closes
/// is left alone.
pub fn heal_structure(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut skipping = false;
    let mut dropped = 0usize;
    let mut kept: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if skipping {
            let continues = line.trim().is_empty()
                || line.starts_with([' ', '\t'])
                || line.trim_start().starts_with('#');
            if continues {
                dropped += 1;
                i += 1;
                continue;
            }
            skipping = false;
        }

        if TOP_LEVEL_SIGNATURE_RE.is_match(line) {
            if let Some((header, last)) = signature_header(&lines, i) {
                if let Some(caps) = TOP_LEVEL_SIGNATURE_RE.captures(&header) {
                    let signature = caps[0].split_whitespace().collect::<Vec<_>>().join(" ");
                    if !seen.insert(signature) {
                        skipping = true;
                        dropped += last - i + 1;
                        i = last + 1;
                        continue;
                    }
                }
            }
        }
        kept.push(line);
        i += 1;
    }

    if dropped > 0 {
        debug!(dropped, "heal_structure removed duplicate declarations");
    }
    let mut healed = collapse_blank_runs(&kept);
    if text.ends_with('\n') && !healed.ends_with('\n') {
        healed.push('\n');
    }
    healed
}

/// Declaration header starting at `lines[start]`, joined up to the line that
/// closes its parameter list, plus the index of that line. `None` when the
/// list is still open at the end of the text.
fn signature_header(lines: &[&str], start: usize) -> Option<(String, usize)> {
    let mut depth = 0isize;
    let mut header = String::new();
    for (idx, line) in lines.iter().enumerate().skip(start) {
        if !header.is_empty() {
            header.push(' ');
        }
        header.push_str(line.trim());
        for c in line.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }
        if depth <= 0 {
            return Some((header, idx));
        }
    }
    None
}

fn collapse_blank_runs(lines: &[&str]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut blank_run = 0usize;
    for line in lines {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > MAX_BLANK_RUN {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n")
}
