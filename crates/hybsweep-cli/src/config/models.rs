use hybsweep::core::models::structure::Structure;
use hybsweep::core::thermo::FormamideCorrection;
use hybsweep::engine::config::PickConfig;
use std::path::PathBuf;

/// Where melting fractions come from.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatorSource {
    Command {
        program: PathBuf,
        args: Vec<String>,
    },
    Thermo {
        dir: PathBuf,
        correction: FormamideCorrection,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub probe_name: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub structure: Structure,
    pub evaluator: EvaluatorSource,
    pub pick: PickConfig,
}
