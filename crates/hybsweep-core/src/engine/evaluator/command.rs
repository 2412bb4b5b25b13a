use super::{EvaluatorError, MELT_ARTIFACT, MeltEvaluator, MeltRequest};
use crate::core::io::{fasta, tsv};
use crate::core::models::condition::Condition;
use crate::core::models::melt::MeltTable;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

pub const DUPLEX_INPUT: &str = "duplex.fa";
pub const FOLD_INPUT: &str = "fold.fa";

/// Runs an external melting predictor once per request.
///
/// The program runs inside the request namespace and receives:
///
/// ```text
/// --temperature T --formamide FA --na NA --mg MG --duplex-type TYPE
/// --concentration C --duplex duplex.fa --fold fold.fa --output melt.tsv [EXTRA...]
/// ```
///
/// It must write `melt.tsv` with a `name  hybridization  fold` header. Fractions
/// it did not compute may be written as `NA`.
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandEvaluator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    fn is_bare_name(&self) -> bool {
        self.program.components().count() == 1
    }

    /// Resolves the program the way the OS would, without running it.
    pub fn locate(&self) -> Option<PathBuf> {
        if !self.is_bare_name() {
            return self.program.is_file().then(|| self.program.clone());
        }
        let path = env::var_os("PATH")?;
        env::split_paths(&path)
            .map(|dir| dir.join(&self.program))
            .find(|candidate| candidate.is_file())
    }

    fn arguments(&self, condition: &Condition) -> Vec<OsString> {
        let pairs = [
            ("--temperature", condition.temperature.to_string()),
            ("--formamide", condition.formamide.to_string()),
            ("--na", condition.sodium.to_string()),
            ("--mg", condition.magnesium.to_string()),
            ("--duplex-type", condition.duplex_type.to_string()),
            ("--concentration", condition.concentration.to_string()),
            ("--duplex", DUPLEX_INPUT.to_string()),
            ("--fold", FOLD_INPUT.to_string()),
            ("--output", MELT_ARTIFACT.to_string()),
        ];
        pairs
            .into_iter()
            .flat_map(|(flag, value)| [OsString::from(flag), OsString::from(value)])
            .chain(self.extra_args.iter().map(OsString::from))
            .collect()
    }
}

impl MeltEvaluator for CommandEvaluator {
    fn name(&self) -> &str {
        "command"
    }

    fn preflight(&self) -> Result<(), EvaluatorError> {
        let found = self
            .locate()
            .ok_or_else(|| EvaluatorError::ProgramNotFound(self.program_name()))?;
        debug!(program = %found.display(), "Located melt evaluator program");
        Ok(())
    }

    fn evaluate(&self, request: &MeltRequest) -> Result<MeltTable, EvaluatorError> {
        let namespace = request.namespace;
        fasta::write_to_path(request.duplex, namespace.join(DUPLEX_INPUT))?;
        fasta::write_to_path(request.fold, namespace.join(FOLD_INPUT))?;

        // A result left over from an earlier run must not pass for this one.
        let artifact = namespace.join(MELT_ARTIFACT);
        if artifact.exists() {
            fs::remove_file(&artifact)?;
        }

        // The child runs inside the namespace, so relative paths are pinned first.
        let program = if self.is_bare_name() {
            self.program.clone()
        } else {
            std::path::absolute(&self.program)?
        };
        let args = self.arguments(request.condition);
        trace!(program = %program.display(), ?args, "Running melt evaluator");
        let output = Command::new(&program)
            .current_dir(namespace)
            .args(&args)
            .output()
            .map_err(|source| EvaluatorError::Launch {
                program: self.program_name(),
                source,
            })?;

        if !output.status.success() {
            return Err(EvaluatorError::Failed {
                program: self.program_name(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !artifact.is_file() {
            return Err(EvaluatorError::MissingArtifact { path: artifact });
        }

        tsv::read_melt_table(&artifact)
            .map_err(|source| EvaluatorError::MalformedArtifact {
                path: artifact,
                source,
            })
    }
}
