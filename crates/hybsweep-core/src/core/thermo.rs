//! Two-state melting model turning tabulated dH/dS into equilibrium fractions.
//!
//! Enthalpies are in kcal/mol and entropies in cal/(mol K), the units produced by
//! common nearest-neighbor and secondary-structure predictors. Salt correction is
//! applied to duplex entropy only; formamide correction applies to both duplexes
//! and folds, following the selected [`FormamideCorrection`] mode.

use crate::core::models::condition::Condition;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Gas constant, cal/(mol K).
pub const GAS_CONSTANT: f64 = 1.987_204;
pub const KELVIN_OFFSET: f64 = 273.15;
/// Melting temperature depression per % formamide (McConaughy et al., 1969), C.
pub const MCCONAUGHY_COEFFICIENT: f64 = 0.72;
/// Molarity of 1% v/v formamide (1.133 g/mL, 45.04 g/mol).
pub const FORMAMIDE_MOLAR_PER_PERCENT: f64 = 0.2516;
/// Default Wright m-value, kcal/(mol M).
pub const DEFAULT_M_VALUE: f64 = 0.1734;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MValueError {
    #[error("Unexpected formamide m-value format '{0}'. Use either 'x' or 'xL+y'")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormamideMode {
    /// Classical linear Tm depression.
    #[default]
    Mcconaughy,
    /// Single-reaction free-energy model with an m-value.
    Wright,
}

impl FromStr for FormamideMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mcconaughy" => Ok(FormamideMode::Mcconaughy),
            "wright" => Ok(FormamideMode::Wright),
            other => Err(format!(
                "Unknown formamide correction '{}'. Expected 'mcconaughy' or 'wright'",
                other
            )),
        }
    }
}

/// Formamide m-value, either constant or linear in the sequence length `L`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MValue {
    Constant(f64),
    Linear { slope: f64, intercept: f64 },
}

impl MValue {
    pub fn at_length(&self, length: usize) -> f64 {
        match *self {
            MValue::Constant(m) => m,
            MValue::Linear { slope, intercept } => slope * length as f64 + intercept,
        }
    }
}

impl Default for MValue {
    fn default() -> Self {
        MValue::Constant(DEFAULT_M_VALUE)
    }
}

impl FromStr for MValue {
    type Err = MValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MValueError::InvalidFormat(s.to_string());
        let trimmed = s.trim();

        match trimmed.split_once('L') {
            Some((slope, intercept)) => {
                if !intercept.starts_with(['+', '-']) {
                    return Err(invalid());
                }
                Ok(MValue::Linear {
                    slope: slope.parse().map_err(|_| invalid())?,
                    intercept: intercept.parse().map_err(|_| invalid())?,
                })
            }
            None => trimmed
                .parse()
                .map(MValue::Constant)
                .map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for MValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MValue::Constant(m) => write!(f, "{}", m),
            MValue::Linear { slope, intercept } => write!(f, "{}L{:+}", slope, intercept),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FormamideCorrection {
    pub mode: FormamideMode,
    pub m_value: MValue,
}

/// Standard enthalpy (kcal/mol) and entropy (cal/(mol K)) of a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermoParams {
    pub enthalpy: f64,
    pub entropy: f64,
}

/// Monovalent-equivalent cation concentration, M (von Ahsen et al., 2001).
pub fn sodium_equivalent(sodium: f64, magnesium: f64) -> f64 {
    if magnesium > 0.0 {
        sodium + 120.0 * (magnesium * 1000.0).sqrt() / 1000.0
    } else {
        sodium
    }
}

/// Duplex entropy corrected from 1 M Na+ to the condition's cation concentration
/// (SantaLucia, 1998).
pub fn salt_corrected_entropy(entropy: f64, length: usize, sodium: f64, magnesium: f64) -> f64 {
    let phosphates = length.saturating_sub(1) as f64;
    entropy + 0.368 * phosphates * sodium_equivalent(sodium, magnesium).ln()
}

/// Reduced free energy `dG / RT` of a transition at `condition`.
fn reduced_free_energy(
    params: ThermoParams,
    entropy: f64,
    length: usize,
    condition: &Condition,
    correction: &FormamideCorrection,
) -> f64 {
    let mut kelvin = condition.temperature + KELVIN_OFFSET;
    let mut delta_g = params.enthalpy * 1000.0;

    match correction.mode {
        FormamideMode::Mcconaughy => {
            kelvin += MCCONAUGHY_COEFFICIENT * condition.formamide;
        }
        FormamideMode::Wright => {
            let formamide_molar = condition.formamide * FORMAMIDE_MOLAR_PER_PERCENT;
            delta_g += correction.m_value.at_length(length) * formamide_molar * 1000.0;
        }
    }

    delta_g -= kelvin * entropy;
    delta_g / (GAS_CONSTANT * kelvin)
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + x.exp())
}

/// Fraction of the strand duplexed with its partner, with the partner in excess
/// at the condition's strand concentration.
pub fn hybridized_fraction(
    params: ThermoParams,
    length: usize,
    condition: &Condition,
    correction: &FormamideCorrection,
) -> f64 {
    let entropy = salt_corrected_entropy(
        params.entropy,
        length,
        condition.sodium,
        condition.magnesium,
    );
    let reduced = reduced_free_energy(params, entropy, length, condition, correction);
    logistic(reduced - condition.concentration.ln())
}

/// Fraction of the sequence folded into the tabulated secondary structure.
pub fn folded_fraction(
    params: ThermoParams,
    length: usize,
    condition: &Condition,
    correction: &FormamideCorrection,
) -> f64 {
    let reduced = reduced_free_energy(params, params.entropy, length, condition, correction);
    logistic(reduced)
}
