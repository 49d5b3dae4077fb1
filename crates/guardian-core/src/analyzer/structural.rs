//! Structural mapping: declarations, normalized imports and content hash.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::analyzer::parser::{FrontEnd, ParseOutcome};
use crate::models::{content_hash, StructuralReport};

pub struct StructuralAnalyzer {
    front_end: Arc<dyn FrontEnd>,
}

impl StructuralAnalyzer {
    pub fn new(front_end: Arc<dyn FrontEnd>) -> Self {
        Self { front_end }
    }

    pub fn language(&self) -> &'static str {
        self.front_end.language()
    }

    pub fn front_end(&self) -> &dyn FrontEnd {
        self.front_end.as_ref()
    }

    /// Map `text` into a [`StructuralReport`].
    ///
    /// Never fails: syntax problems and front-end errors both produce a
    /// report with `valid = false`, empty declarations and the hash of the
    /// raw bytes.
    pub fn map(&self, text: &str, id: &str) -> StructuralReport {
        let hash = content_hash(text);
        match self.front_end.parse(text) {
            Ok(ParseOutcome::Parsed(decls)) => {
                debug!(
                    id,
                    functions = decls.functions.len(),
                    classes = decls.classes.len(),
                    imports = decls.imports.len(),
                    "structural map complete"
                );
                StructuralReport {
                    functions: decls.functions,
                    classes: decls.classes,
                    imports: decls.imports,
                    content_hash: hash,
                    valid: true,
                    syntax_error: None,
                }
            }
            Ok(ParseOutcome::Failed(failure)) => {
                warn!(id, error = %failure, "unit failed to parse");
                StructuralReport::invalid(hash, failure.to_string())
            }
            Err(e) => {
                warn!(id, error = %e, "front-end unavailable");
                StructuralReport::invalid(hash, e.to_string())
            }
        }
    }
}
