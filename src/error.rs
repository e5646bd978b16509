use crate::types::PipelineStage;
use thiserror::Error;

/// Failures surfaced by the simulation pipeline
#[derive(Error, Debug)]
pub enum SimError {
    /// Fewer players than a match needs. The pipeline reports this as an
    /// absent match; the variant exists so the shell can render a message.
    #[error("Insufficient pool: {available} players available, {required} required")]
    InsufficientPool { available: usize, required: usize },

    #[error("Practice hours have not been generated; map familiarity is unavailable")]
    MissingFamiliarityData,

    #[error("Cannot {operation} while pipeline is at stage {stage:?}")]
    StageViolation {
        operation: &'static str,
        stage: PipelineStage,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

