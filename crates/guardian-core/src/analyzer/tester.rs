//! Cheap sanity checks run on every analyzed unit.
//!
//! Declaration counts here come from line patterns, not the parse tree, so
//! they can be cross-checked against the structural report.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::warn;

use crate::analyzer::parser::FrontEnd;
use crate::models::{TestMetrics, TestReport};

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:class[ \t]+[A-Za-z_]|type[ \t]+[A-Za-z_][A-Za-z0-9_]*[ \t]+(?:struct|interface)\b)",
    )
    .unwrap()
});

static FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:async[ \t]+)?(?:def|func)\b").unwrap());

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:import\b|from[ \t]+\S+[ \t]+import\b)").unwrap()
});

// Go `import ( ... )` group; the body holds one quoted path per import.
static GO_IMPORT_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*import[ \t]*\(([^)]*)\)").unwrap());

static GO_IMPORT_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"\n]*"|`[^`]*`"#).unwrap());

// Dynamic-execution primitives.
static DANGEROUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(eval|exec)\s*\(").unwrap());

pub struct TestExecutor {
    front_end: Arc<dyn FrontEnd>,
}

impl TestExecutor {
    pub fn new(front_end: Arc<dyn FrontEnd>) -> Self {
        Self { front_end }
    }

    pub fn run_basic_tests(&self, text: &str) -> TestReport {
        let mut errors = Vec::new();
        let syntax_valid = match self.front_end.check_syntax(text) {
            Ok(None) => true,
            Ok(Some(failure)) => {
                errors.push(format!("Syntax error: {failure}"));
                false
            }
            Err(e) => {
                errors.push(format!("Syntax check unavailable: {e}"));
                false
            }
        };

        for warning in dangerous_constructs(text) {
            warn!(%warning, "dangerous construct");
            errors.push(warning);
        }

        TestReport {
            syntax_valid,
            errors,
            metrics: metrics(text),
        }
    }
}

pub fn metrics(text: &str) -> TestMetrics {
    TestMetrics {
        lines: text.lines().count(),
        classes: CLASS_RE.find_iter(text).count(),
        functions: FUNCTION_RE.find_iter(text).count(),
        imports: import_count(text),
    }
}

/// Import statements, except that a grouped Go import counts each path.
/// A Python `from m import a, b` still counts once.
fn import_count(text: &str) -> usize {
    let mut count = IMPORT_RE.find_iter(text).count();
    for caps in GO_IMPORT_GROUP_RE.captures_iter(text) {
        // The `import (` line itself was already counted once.
        count = (count + GO_IMPORT_PATH_RE.find_iter(&caps[1]).count()).saturating_sub(1);
    }
    count
}

/// Advisory warnings, one per occurrence, in source order.
pub fn dangerous_constructs(text: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        for caps in DANGEROUS_RE.captures_iter(line) {
            warnings.push(format!(
                "Warning: use of `{}` at line {} can execute arbitrary code",
                &caps[1],
                idx + 1
            ));
        }
    }
    warnings
}
