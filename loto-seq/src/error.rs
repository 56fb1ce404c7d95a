use std::path::PathBuf;

use thiserror::Error;

/// Failures of the forecasting pipeline.
///
/// Malformed draw values never show up here: the encoder drops them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Insufficient history: need at least {required} draws, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("History is not in chronological order at index {index}")]
    UnorderedHistory { index: usize },

    #[error("Missing {kind} artifact at {path:?}")]
    MissingArtifact { kind: &'static str, path: PathBuf },

    #[error("Predictor unavailable: {0}")]
    UnavailablePredictor(&'static str),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Linear solver failed: {0}")]
    Solver(String),

    #[error("Artifact error: {0}")]
    Artifact(String),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
