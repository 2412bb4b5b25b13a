use hybsweep::core::models::condition::DuplexType;
use hybsweep::core::thermo::{DEFAULT_M_VALUE, FormamideMode};
use hybsweep::engine::scoring::GoodnessModel;
use hybsweep::engine::selection::TieBreak;

/// Built-in values of a stage's default condition and sweep range.
#[derive(Debug, Clone, PartialEq)]
pub struct StageDefaults {
    pub temperature: f64,
    pub step: f64,
    /// The range spans `temperature +/- span`, floored at zero, unless min or
    /// max are given.
    pub span: f64,
    pub formamide: f64,
    pub sodium: f64,
    pub magnesium: f64,
    pub duplex_type: DuplexType,
    pub concentration: f64,
}

impl Default for StageDefaults {
    fn default() -> Self {
        Self {
            temperature: 37.0,
            step: 0.5,
            span: 10.0,
            formamide: 35.0,
            sodium: 0.05,
            magnesium: 0.0,
            duplex_type: DuplexType::DnaDna,
            concentration: 0.25e-6,
        }
    }
}

pub struct DefaultsConfig {
    pub h1: StageDefaults,
    pub h2: StageDefaults,
    pub bystander_duplex_type: DuplexType,
    pub bystander_concentration: f64,
    pub parallel: bool,
    pub tie_break: TieBreak,
    pub goodness: GoodnessModel,
    pub fa_mode: FormamideMode,
    pub fa_mvalue: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            h1: StageDefaults::default(),
            h2: StageDefaults::default(),
            bystander_duplex_type: DuplexType::DnaDna,
            bystander_concentration: 0.25e-6,
            parallel: false,
            tie_break: TieBreak::default(),
            goodness: GoodnessModel::default(),
            fa_mode: FormamideMode::default(),
            fa_mvalue: DEFAULT_M_VALUE.to_string(),
        }
    }
}
