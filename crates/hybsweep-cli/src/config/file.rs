use crate::error::{CliError, Result};
use hybsweep::core::models::condition::DuplexType;
use hybsweep::core::thermo::FormamideMode;
use hybsweep::engine::scoring::GoodnessModel;
use hybsweep::engine::selection::TieBreak;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileStageConfig {
    pub temperature: Option<f64>,
    pub step: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub formamide: Option<f64>,
    pub sodium: Option<f64>,
    pub magnesium: Option<f64>,
    pub duplex_type: Option<DuplexType>,
    pub concentration: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileBystanderConfig {
    pub duplex_type: Option<DuplexType>,
    pub concentration: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSweepConfig {
    pub parallel: Option<bool>,
    pub threads: Option<usize>,
    pub early_stop: Option<usize>,
    pub tie_break: Option<TieBreak>,
    pub goodness: Option<GoodnessModel>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileEvaluatorConfig {
    pub melt_command: Option<PathBuf>,
    pub melt_args: Option<Vec<String>>,
    pub thermo_dir: Option<PathBuf>,
    pub fa_mode: Option<FormamideMode>,
    pub fa_mvalue: Option<String>,
}

/// The TOML configuration file. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub structure: Option<String>,
    pub h1: Option<FileStageConfig>,
    pub h2: Option<FileStageConfig>,
    pub bystander: Option<FileBystanderConfig>,
    pub sweep: Option<FileSweepConfig>,
    pub evaluator: Option<FileEvaluatorConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_every_section() {
        let config: FileConfig = toml::from_str(
            r#"
            structure = "20,20,30,20"

            [h1]
            temperature = 40.0
            step = 0.25
            duplex-type = "DNA:RNA"

            [h2]
            formamide = 30.0

            [bystander]
            concentration = 1e-6

            [sweep]
            parallel = true
            threads = 2
            early-stop = 4
            tie-break = "closest-to-default"
            goodness = "independent"

            [evaluator]
            thermo-dir = "tables"
            fa-mode = "wright"
            fa-mvalue = "0.2L+1"
            "#,
        )
        .unwrap();

        assert_eq!(config.structure.as_deref(), Some("20,20,30,20"));
        let h1 = config.h1.unwrap();
        assert_eq!(h1.temperature, Some(40.0));
        assert_eq!(h1.duplex_type, Some(DuplexType::DnaRna));
        assert_eq!(config.h2.unwrap().formamide, Some(30.0));
        let sweep = config.sweep.unwrap();
        assert_eq!(sweep.tie_break, Some(TieBreak::ClosestToDefault));
        assert_eq!(sweep.goodness, Some(GoodnessModel::Independent));
        assert_eq!(sweep.early_stop, Some(4));
        let evaluator = config.evaluator.unwrap();
        assert_eq!(evaluator.fa_mode, Some(FormamideMode::Wright));
        assert_eq!(evaluator.thermo_dir, Some(PathBuf::from("tables")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[h1]\ntemp = 40.0\n").unwrap();

        let result = FileConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
