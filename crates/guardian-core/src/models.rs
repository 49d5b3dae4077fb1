//! Shared typed models produced by the analyzers and kept by the memory kernel.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters kept for content-addressed patch ids.
pub const PATCH_ID_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// SHA-256 hex digest of the exact bytes of `text`.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Short content-addressed id (first 16 hex chars of SHA-256).
pub fn short_hash(text: &str) -> String {
    let digest = content_hash(text);
    digest[..PATCH_ID_LEN].to_string()
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Structural
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub arg_count: usize,
    /// 1-based source line.
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub line: usize,
    /// Functions declared directly in the class body, in source order.
    pub methods: Vec<String>,
}

/// Declaration-level summary of one source unit.
///
/// `content_hash` is populated even when the unit fails to parse; the
/// declaration lists are empty in that case and `syntax_error` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuralReport {
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub imports: Vec<String>,
    pub content_hash: String,
    pub valid: bool,
    pub syntax_error: Option<String>,
}

impl StructuralReport {
    pub fn invalid(content_hash: String, syntax_error: String) -> Self {
        Self {
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            content_hash,
            valid: false,
            syntax_error: Some(syntax_error),
        }
    }
}

// ---------------------------------------------------------------------------
// Semantic
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SemanticSummary {
    /// Subset of the concept vocabulary; ordered for determinism.
    pub concepts: BTreeSet<String>,
    /// Always within `[0, 10]`.
    pub complexity: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestMetrics {
    pub lines: usize,
    pub classes: usize,
    pub functions: usize,
    pub imports: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub syntax_valid: bool,
    /// Syntax errors first, then advisory warnings.
    pub errors: Vec<String>,
    pub metrics: TestMetrics,
}

// ---------------------------------------------------------------------------
// Analysis bundle
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub identifier: String,
    pub structural: StructuralReport,
    pub semantic: SemanticSummary,
    pub tests: TestReport,
    pub content_hash: String,
    /// Whether the heal passes rewrote the text before analysis.
    #[serde(default)]
    pub healed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub id_a: String,
    pub id_b: String,
    pub semantic_similarity: f64,
    pub hashes_equal: bool,
    pub hash_a: String,
    pub hash_b: String,
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Content-addressed unified diff between two versions of a unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub id: String,
    pub timestamp: f64,
    pub diff_text: String,
    pub lines_added: usize,
    pub lines_removed: usize,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.diff_text.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub payload: serde_json::Value,
    pub timestamp: f64,
    /// Serialized payload length in bytes at store time.
    pub size: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySummary {
    pub total_records: usize,
    pub total_size: usize,
    pub latest_timestamp: Option<f64>,
}
