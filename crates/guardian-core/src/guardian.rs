//! Guardian orchestrator: analyze, compare and diff over the component stack.

use std::sync::Arc;

use tracing::{info, info_span, Dispatch};

use crate::analyzer::heal::{heal_structure, heal_syntax};
use crate::analyzer::parser::{front_end_for, FrontEnd};
use crate::analyzer::semantic::SemanticAnalyzer;
use crate::analyzer::structural::StructuralAnalyzer;
use crate::analyzer::tester::TestExecutor;
use crate::config::GuardianConfig;
use crate::errors::{GuardianError, GuardianResult};
use crate::models::{AnalysisReport, Comparison, MemorySummary, Patch};
use crate::patch::{apply_patch, generate_patch_with_context};
use crate::store::memory::MemoryKernel;

pub struct Guardian {
    config: GuardianConfig,
    structural: StructuralAnalyzer,
    semantic: SemanticAnalyzer,
    tester: TestExecutor,
    memory: MemoryKernel,
    dispatch: Option<Dispatch>,
}

impl Default for Guardian {
    fn default() -> Self {
        Self::new(GuardianConfig::default())
    }
}

impl Guardian {
    pub fn new(config: GuardianConfig) -> Self {
        let front_end = front_end_for(config.language);
        Self::with_front_end(config, front_end)
    }

    /// Build with a caller-supplied front-end instead of the configured one.
    pub fn with_front_end(config: GuardianConfig, front_end: Arc<dyn FrontEnd>) -> Self {
        let memory = match config.max_records {
            Some(max) => MemoryKernel::with_capacity(max),
            None => MemoryKernel::new(),
        };
        Self {
            structural: StructuralAnalyzer::new(Arc::clone(&front_end)),
            semantic: SemanticAnalyzer::new(),
            tester: TestExecutor::new(front_end),
            memory,
            config,
            dispatch: None,
        }
    }

    pub fn from_env() -> GuardianResult<Self> {
        Ok(Self::new(GuardianConfig::from_env()?))
    }

    /// Route this instance's logs to `dispatch` instead of the caller's
    /// current default subscriber.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn config(&self) -> &GuardianConfig {
        &self.config
    }

    pub fn semantic(&self) -> &SemanticAnalyzer {
        &self.semantic
    }

    pub fn memory(&self) -> &MemoryKernel {
        &self.memory
    }

    fn scoped<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    /// Run the structural, semantic and test stages over `text`, store the
    /// bundle under `id` (replacing any earlier one) and return it.
    ///
    /// Malformed input never fails the call; it yields a report with
    /// `valid = false`. Errors come only from storing the report.
    pub fn analyze(&self, text: &str, id: &str) -> GuardianResult<AnalysisReport> {
        self.scoped(|| {
            let span = info_span!("analyze", id);
            let _enter = span.enter();

            let healed_text;
            let (source, healed) = if self.config.auto_heal {
                healed_text = heal_structure(&heal_syntax(text));
                let changed = healed_text != text;
                (healed_text.as_str(), changed)
            } else {
                (text, false)
            };

            let structural = self.structural.map(source, id);
            let semantic = self.semantic.analyze(source, id);
            let tests = self.tester.run_basic_tests(source);

            let report = AnalysisReport {
                identifier: id.to_string(),
                content_hash: structural.content_hash.clone(),
                structural,
                semantic,
                tests,
                healed,
            };

            let evicted = self.memory.store(id, &report)?;
            for old_id in &evicted {
                self.semantic.forget(old_id);
            }

            info!(
                valid = report.structural.valid,
                syntax_valid = report.tests.syntax_valid,
                functions = report.structural.functions.len(),
                classes = report.structural.classes.len(),
                complexity = report.semantic.complexity,
                healed,
                "analysis stored"
            );
            Ok(report)
        })
    }

    /// Compare two previously analyzed units.
    ///
    /// Both ids must have a stored report; otherwise this returns
    /// [`GuardianError::MissingAnalysis`] naming the missing ids and does
    /// not analyze anything.
    pub fn compare(&self, id_a: &str, id_b: &str) -> GuardianResult<Comparison> {
        self.scoped(|| {
            let report_a = self.report(id_a)?;
            let report_b = self.report(id_b)?;
            let (report_a, report_b) = match (report_a, report_b) {
                (Some(a), Some(b)) => (a, b),
                (a, b) => {
                    let mut ids = Vec::new();
                    if a.is_none() {
                        ids.push(id_a.to_string());
                    }
                    if b.is_none() && id_b != id_a {
                        ids.push(id_b.to_string());
                    }
                    tracing::warn!(missing = ?ids, "compare without prior analysis");
                    return Err(GuardianError::MissingAnalysis { ids });
                }
            };

            let comparison = Comparison {
                id_a: id_a.to_string(),
                id_b: id_b.to_string(),
                semantic_similarity: self.semantic.similarity(id_a, id_b),
                hashes_equal: report_a.content_hash == report_b.content_hash,
                hash_a: report_a.content_hash,
                hash_b: report_b.content_hash,
            };
            info!(
                id_a,
                id_b,
                similarity = comparison.semantic_similarity,
                hashes_equal = comparison.hashes_equal,
                "comparison complete"
            );
            Ok(comparison)
        })
    }

    pub fn diff(&self, original: &str, modified: &str) -> Patch {
        self.scoped(|| {
            let patch = generate_patch_with_context(original, modified, self.config.diff_context);
            tracing::debug!(
                patch_id = %patch.id,
                added = patch.lines_added,
                removed = patch.lines_removed,
                "patch generated"
            );
            patch
        })
    }

    /// Heuristic re-application; see [`apply_patch`].
    pub fn apply(&self, base: &str, patch: &Patch) -> GuardianResult<String> {
        self.scoped(|| apply_patch(base, patch))
    }

    pub fn report(&self, id: &str) -> GuardianResult<Option<AnalysisReport>> {
        self.memory.retrieve_as(id)
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.memory.list_ids()
    }

    pub fn memory_summary(&self) -> MemorySummary {
        self.memory.summary()
    }

    /// Clear stored reports (all, or all but the `keep_last_n` newest) and
    /// drop their cached semantic summaries. Returns the number removed.
    pub fn clear_memory(&self, keep_last_n: Option<usize>) -> usize {
        self.scoped(|| {
            let removed = self.memory.clear_ids(keep_last_n);
            for id in &removed {
                self.semantic.forget(id);
            }
            removed.len()
        })
    }
}
