//! Concept tagging, complexity scoring and cross-unit similarity.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use parking_lot::Mutex;
use regex::Regex;
use tracing::debug;

use crate::models::SemanticSummary;

/// Closed concept vocabulary. Tags are only ever drawn from this list.
pub const CONCEPT_VOCABULARY: &[&str] = &[
    "engine",
    "system",
    "economy",
    "combat",
    "inventory",
    "log",
    "event",
    "time",
    "energy",
    "entity",
    "player",
    "world",
    "resource",
    "memory",
    "patch",
    "test",
    "config",
    "state",
    "network",
    "agent",
];

pub const MAX_COMPLEXITY: f64 = 10.0;

// Function, class, conditional and loop keywords.
static DENSITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:def|func|function|class|struct|if|elif|for|while)\b").unwrap()
});

/// Semantic analyzer with a per-id summary cache for similarity queries.
#[derive(Default)]
pub struct SemanticAnalyzer {
    cache: Mutex<HashMap<String, SemanticSummary>>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag `text` and cache the summary under `id`, replacing any previous one.
    pub fn analyze(&self, text: &str, id: &str) -> SemanticSummary {
        let summary = summarize(text);
        debug!(
            id,
            concepts = summary.concepts.len(),
            complexity = summary.complexity,
            "semantic summary"
        );
        self.cache.lock().insert(id.to_string(), summary.clone());
        summary
    }

    pub fn cached(&self, id: &str) -> Option<SemanticSummary> {
        self.cache.lock().get(id).cloned()
    }

    pub fn forget(&self, id: &str) -> bool {
        self.cache.lock().remove(id).is_some()
    }

    /// Jaccard index of the cached concept sets.
    ///
    /// Returns 0.0 when either id has no cached summary, and 1.0 when both
    /// concept sets are empty.
    pub fn similarity(&self, id_a: &str, id_b: &str) -> f64 {
        let cache = self.cache.lock();
        match (cache.get(id_a), cache.get(id_b)) {
            (Some(a), Some(b)) => jaccard(&a.concepts, &b.concepts),
            _ => 0.0,
        }
    }
}

/// Stateless summary of `text`.
pub fn summarize(text: &str) -> SemanticSummary {
    let lowered = text.to_lowercase();
    let concepts: BTreeSet<String> = CONCEPT_VOCABULARY
        .iter()
        .filter(|token| lowered.contains(*token))
        .map(|token| token.to_string())
        .collect();
    let density = DENSITY_RE.find_iter(&lowered).count();
    let word_count = lowered.split_whitespace().count();
    SemanticSummary {
        complexity: complexity_score(concepts.len(), density, word_count),
        concepts,
    }
}

/// `(2 * concepts + density) / (words / 100 + 1)`, clamped to `[0, 10]`.
pub fn complexity_score(concepts: usize, density: usize, word_count: usize) -> f64 {
    let raw = (2.0 * concepts as f64 + density as f64) / (word_count as f64 / 100.0 + 1.0);
    if raw.is_finite() {
        raw.clamp(0.0, MAX_COMPLEXITY)
    } else {
        0.0
    }
}

pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}
