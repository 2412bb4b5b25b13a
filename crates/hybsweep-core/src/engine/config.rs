use super::scoring::GoodnessModel;
use super::selection::TieBreak;
use crate::core::models::condition::{Condition, ConditionError, DuplexType};
use crate::core::models::oligo::SequenceSubset;
use crate::core::models::structure::Segment;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid {stage} condition: {source}")]
    InvalidCondition {
        stage: Stage,
        #[source]
        source: ConditionError,
    },
}

/// Hybridization stage. H1 binds the probe to its target, H2 binds the labeled
/// oligo to the color flap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    H1,
    H2,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::H1 => "H1",
            Stage::H2 => "H2",
        }
    }

    pub fn phase_name(&self) -> &'static str {
        match self {
            Stage::H1 => "H1 temperature sweep",
            Stage::H2 => "H2 temperature sweep",
        }
    }

    /// Sub-sequence that forms the duplex of interest.
    pub fn duplex_subset(&self) -> SequenceSubset {
        match self {
            Stage::H1 => SequenceSubset::Segment(Segment::Target),
            Stage::H2 => SequenceSubset::Segment(Segment::Color),
        }
    }

    /// Sub-sequence checked for competing secondary structure.
    pub fn fold_subset(&self) -> SequenceSubset {
        match self {
            Stage::H1 => SequenceSubset::Full,
            Stage::H2 => SequenceSubset::ColorForward,
        }
    }

    /// Sub-sequence whose duplex competes with the one of interest, if any.
    pub fn bystander_subset(&self) -> Option<SequenceSubset> {
        match self {
            Stage::H1 => None,
            Stage::H2 => Some(SequenceSubset::Segment(Segment::Target)),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Finest sweep step. Grid temperatures and artifact namespaces carry four
/// decimals, so a finer step would plan points that cannot be told apart.
pub const MIN_TEMPERATURE_STEP: f64 = 1e-4;

/// Temperatures swept around a stage's default, in Celsius degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureRange {
    pub default: f64,
    pub step: f64,
    pub min: f64,
    pub max: f64,
}

impl TemperatureRange {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &'static str, reason: &str| ConfigError::InvalidParameter {
            name,
            reason: reason.to_string(),
        };
        for (name, value) in [
            ("temperature", self.default),
            ("step", self.step),
            ("min", self.min),
            ("max", self.max),
        ] {
            if !value.is_finite() {
                return Err(invalid(name, "must be a finite number"));
            }
        }
        if self.step <= 0.0 {
            return Err(invalid("step", "must be > 0"));
        }
        if self.step < MIN_TEMPERATURE_STEP {
            return Err(ConfigError::InvalidParameter {
                name: "step",
                reason: format!("must be >= {MIN_TEMPERATURE_STEP}"),
            });
        }
        if self.min < 0.0 {
            return Err(invalid("min", "must be >= 0"));
        }
        if self.min > self.default || self.default > self.max {
            return Err(ConfigError::InvalidParameter {
                name: "temperature",
                reason: format!(
                    "default {} must lie within [{}, {}]",
                    self.default, self.min, self.max
                ),
            });
        }
        Ok(())
    }
}

/// Duplex parameters of the competing bystander interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BystanderConfig {
    pub duplex_type: DuplexType,
    pub concentration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    pub stage: Stage,
    pub range: TemperatureRange,
    /// Condition at the default temperature.
    pub condition: Condition,
    pub bystander: Option<BystanderConfig>,
}

impl StageConfig {
    pub fn default_temperature(&self) -> f64 {
        self.range.default
    }

    pub fn default_formamide(&self) -> f64 {
        self.condition.formamide
    }

    /// The bystander duplex is evaluated at the stage's own temperature, formamide
    /// and ions, with its own duplex type and concentration.
    pub fn bystander_condition(&self) -> Option<Condition> {
        self.bystander.map(|b| Condition {
            duplex_type: b.duplex_type,
            concentration: b.concentration,
            ..self.condition
        })
    }
}

pub struct StageConfigBuilder {
    stage: Stage,
    temperature: Option<f64>,
    step: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
    formamide: Option<f64>,
    sodium: Option<f64>,
    magnesium: Option<f64>,
    duplex_type: Option<DuplexType>,
    concentration: Option<f64>,
    bystander: Option<BystanderConfig>,
}

impl StageConfigBuilder {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            temperature: None,
            step: None,
            min: None,
            max: None,
            formamide: None,
            sodium: None,
            magnesium: None,
            duplex_type: None,
            concentration: None,
            bystander: None,
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
    pub fn formamide(mut self, formamide: f64) -> Self {
        self.formamide = Some(formamide);
        self
    }
    pub fn sodium(mut self, sodium: f64) -> Self {
        self.sodium = Some(sodium);
        self
    }
    pub fn magnesium(mut self, magnesium: f64) -> Self {
        self.magnesium = Some(magnesium);
        self
    }
    pub fn duplex_type(mut self, duplex_type: DuplexType) -> Self {
        self.duplex_type = Some(duplex_type);
        self
    }
    pub fn concentration(mut self, concentration: f64) -> Self {
        self.concentration = Some(concentration);
        self
    }
    pub fn bystander(mut self, bystander: BystanderConfig) -> Self {
        self.bystander = Some(bystander);
        self
    }

    pub fn build(self) -> Result<StageConfig, ConfigError> {
        let range = TemperatureRange {
            default: self
                .temperature
                .ok_or(ConfigError::MissingParameter("temperature"))?,
            step: self.step.ok_or(ConfigError::MissingParameter("step"))?,
            min: self.min.ok_or(ConfigError::MissingParameter("min"))?,
            max: self.max.ok_or(ConfigError::MissingParameter("max"))?,
        };
        range.validate()?;

        let condition = Condition {
            temperature: range.default,
            formamide: self
                .formamide
                .ok_or(ConfigError::MissingParameter("formamide"))?,
            sodium: self.sodium.ok_or(ConfigError::MissingParameter("sodium"))?,
            magnesium: self.magnesium.unwrap_or(0.0),
            duplex_type: self.duplex_type.unwrap_or_default(),
            concentration: self
                .concentration
                .ok_or(ConfigError::MissingParameter("concentration"))?,
        };
        let stage = self.stage;
        condition
            .validate()
            .map_err(|source| ConfigError::InvalidCondition { stage, source })?;

        let bystander = match (stage.bystander_subset(), self.bystander) {
            (Some(_), None) => return Err(ConfigError::MissingParameter("bystander")),
            (None, Some(_)) => {
                return Err(ConfigError::InvalidParameter {
                    name: "bystander",
                    reason: format!("stage {} has no bystander duplex", stage),
                });
            }
            (_, bystander) => bystander,
        };

        let config = StageConfig {
            stage,
            range,
            condition,
            bystander,
        };
        if let Some(condition) = config.bystander_condition() {
            condition
                .validate()
                .map_err(|source| ConfigError::InvalidCondition { stage, source })?;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepStrategy {
    /// Default temperature first, then downward, then upward.
    #[default]
    Sequential,
    /// The whole grid at once on a dedicated worker pool.
    Parallel { threads: usize },
}

/// Abandons a sweep direction after `patience` consecutive points that do not
/// improve the running best. Only the sequential strategy honors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarlyStop {
    pub patience: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SweepConfig {
    pub strategy: SweepStrategy,
    pub early_stop: Option<EarlyStop>,
    pub tie_break: TieBreak,
    pub goodness: GoodnessModel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickConfig {
    pub h1: StageConfig,
    pub h2: StageConfig,
    pub sweep: SweepConfig,
    /// Root under which every evaluated condition gets its own directory.
    pub work_dir: PathBuf,
}

impl PickConfig {
    pub fn stages(&self) -> [&StageConfig; 2] {
        [&self.h1, &self.h2]
    }
}

#[derive(Default)]
pub struct PickConfigBuilder {
    h1: Option<StageConfig>,
    h2: Option<StageConfig>,
    sweep: SweepConfig,
    work_dir: Option<PathBuf>,
}

impl PickConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn h1(mut self, config: StageConfig) -> Self {
        self.h1 = Some(config);
        self
    }
    pub fn h2(mut self, config: StageConfig) -> Self {
        self.h2 = Some(config);
        self
    }
    pub fn strategy(mut self, strategy: SweepStrategy) -> Self {
        self.sweep.strategy = strategy;
        self
    }
    pub fn early_stop(mut self, early_stop: Option<EarlyStop>) -> Self {
        self.sweep.early_stop = early_stop;
        self
    }
    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.sweep.tie_break = tie_break;
        self
    }
    pub fn goodness(mut self, goodness: GoodnessModel) -> Self {
        self.sweep.goodness = goodness;
        self
    }
    pub fn work_dir(mut self, path: PathBuf) -> Self {
        self.work_dir = Some(path);
        self
    }

    pub fn build(self) -> Result<PickConfig, ConfigError> {
        let h1 = self.h1.ok_or(ConfigError::MissingParameter("h1"))?;
        let h2 = self.h2.ok_or(ConfigError::MissingParameter("h2"))?;
        for (expected, config) in [(Stage::H1, &h1), (Stage::H2, &h2)] {
            if config.stage != expected {
                return Err(ConfigError::InvalidParameter {
                    name: "stage",
                    reason: format!(
                        "expected {} configuration, got {}",
                        expected, config.stage
                    ),
                });
            }
        }
        if let SweepStrategy::Parallel { threads: 0 } = self.sweep.strategy {
            return Err(ConfigError::InvalidParameter {
                name: "threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(EarlyStop { patience: 0 }) = self.sweep.early_stop {
            return Err(ConfigError::InvalidParameter {
                name: "early_stop",
                reason: "patience must be at least 1".to_string(),
            });
        }

        Ok(PickConfig {
            h1,
            h2,
            sweep: self.sweep,
            work_dir: self
                .work_dir
                .ok_or(ConfigError::MissingParameter("work_dir"))?,
        })
    }
}
