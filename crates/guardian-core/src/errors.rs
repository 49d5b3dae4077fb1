//! Error types for the Guardian core library.

/// Top-level error enum for the Guardian core library.
///
/// Parse failures of analyzed source never surface here; they are folded
/// into the structural and test reports instead.
#[derive(Debug, thiserror::Error)]
pub enum GuardianError {
    #[error("Front-end error: {0}")]
    FrontEnd(String),

    #[error("Patch error: {0}")]
    Patch(String),

    #[error("No stored analysis for: {}", ids.join(", "))]
    MissingAnalysis { ids: Vec<String> },

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GuardianResult<T> = Result<T, GuardianError>;
