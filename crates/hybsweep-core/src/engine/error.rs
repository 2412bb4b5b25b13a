use super::config::ConfigError;
use super::evaluator::EvaluatorError;
use super::scoring::ScoreError;
use crate::core::io::tsv::TsvError;
use crate::core::models::structure::StructureError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Probe structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("Melt evaluator '{evaluator}' is unavailable: {source}")]
    EvaluatorUnavailable {
        evaluator: String,
        #[source]
        source: EvaluatorError,
    },

    #[error("Melt evaluation failed at {temperature:.2} C: {source}")]
    ExternalTool {
        temperature: f64,
        #[source]
        source: EvaluatorError,
    },

    #[error("Score computation failed at {temperature:.2} C: {source}")]
    ScoreComputation {
        temperature: f64,
        #[source]
        source: ScoreError,
    },

    #[error("Requested {requested} worker threads, but only {available} are available")]
    ConcurrencyLimit { requested: usize, available: usize },

    #[error("{count} of {total} sweep conditions failed: {source}", count = failed.len())]
    SweepFailed {
        failed: Vec<f64>,
        total: usize,
        #[source]
        source: Box<EngineError>,
    },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: TsvError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether the error comes from the melt evaluator boundary.
    pub fn is_external_tool(&self) -> bool {
        matches!(
            self,
            EngineError::ExternalTool { .. } | EngineError::EvaluatorUnavailable { .. }
        ) || matches!(self, EngineError::SweepFailed { source, .. } if source.is_external_tool())
    }
}
