//! Guardian core library: single-unit source analysis.
//!
//! A [`Guardian`] takes one unit of source text and runs a structural map
//! (functions, classes, imports), a semantic summary over a fixed concept
//! vocabulary and a set of cheap checks (syntax validity, metrics, dangerous
//! constructs). Results are bundled into an [`AnalysisReport`] and kept in an
//! in-memory store keyed by caller-supplied identifier, so two units can be
//! compared later. Alongside analysis the crate generates content-addressed
//! unified-diff patches and offers two opt-in textual repair passes.
//!
//! Python is the default source language; Go is available through
//! [`config::SourceLanguage`].

pub mod analyzer;
pub mod config;
pub mod errors;
pub mod guardian;
pub mod models;
pub mod patch;
pub mod store;

pub use analyzer::heal::{heal_structure, heal_syntax};
pub use analyzer::parser::{front_end_for, FrontEnd};
pub use config::{GuardianConfig, SourceLanguage};
pub use errors::{GuardianError, GuardianResult};
pub use guardian::Guardian;
pub use models::{
    AnalysisReport, Comparison, MemorySummary, Patch, SemanticSummary, StructuralReport,
    TestReport,
};
pub use patch::{apply_patch, generate_patch, generate_patch_with_context};
pub use store::MemoryKernel;
