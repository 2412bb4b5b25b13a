//! The boundary to melting and secondary-structure prediction.
//!
//! The engine only needs per-oligo hybridization and fold fractions for a condition.
//! How they are obtained is up to the [`MeltEvaluator`] implementation: an external
//! program ([`command::CommandEvaluator`]) or a two-state model over precomputed
//! thermodynamic tables ([`thermo::ThermoEvaluator`]).

use crate::core::io::tsv::TsvError;
use crate::core::models::condition::Condition;
use crate::core::models::melt::MeltTable;
use crate::core::models::oligo::SequenceRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod command;
pub mod thermo;

/// Name of the fractions table every evaluator leaves in its namespace.
pub const MELT_ARTIFACT: &str = "melt.tsv";

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Program '{0}' was not found")]
    ProgramNotFound(String),

    #[error("Expected result '{path}' was not produced", path = path.display())]
    MissingArtifact { path: PathBuf },

    #[error("Result '{path}' is malformed: {source}", path = path.display())]
    MalformedArtifact {
        path: PathBuf,
        #[source]
        source: TsvError,
    },

    #[error("No {role} parameters for sequence '{name}'")]
    MissingParameters { name: String, role: &'static str },

    #[error("Failed to read table '{path}': {source}", path = path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: TsvError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One evaluation: the sequences to look at and where their artifacts go.
#[derive(Debug, Clone, Copy)]
pub struct MeltRequest<'a> {
    pub condition: &'a Condition,
    /// Sequences whose duplex with their complement is evaluated.
    pub duplex: &'a [SequenceRecord],
    /// Sequences checked for secondary structure. May be empty.
    pub fold: &'a [SequenceRecord],
    /// Existing directory owned by this request only.
    pub namespace: &'a Path,
}

pub trait MeltEvaluator: Send + Sync {
    fn name(&self) -> &str;

    /// Checks that the evaluator can run at all, before any sweep starts.
    fn preflight(&self) -> Result<(), EvaluatorError> {
        Ok(())
    }

    fn evaluate(&self, request: &MeltRequest) -> Result<MeltTable, EvaluatorError>;
}
