use super::state::{ConditionScore, OligoScore};
use crate::core::models::melt::MeltTable;
use crate::core::utils::numeric::round_to;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractionKind {
    Hybridization,
    Fold,
    Bystander,
}

impl fmt::Display for FractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FractionKind::Hybridization => "hybridization",
            FractionKind::Fold => "fold",
            FractionKind::Bystander => "bystander hybridization",
        })
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ScoreError {
    #[error("No {kind} fraction for oligo '{oligo}'")]
    MissingFraction { oligo: String, kind: FractionKind },

    #[error("The {kind} fraction of oligo '{oligo}' is {value}, outside [0, 1]")]
    OutOfRange {
        oligo: String,
        kind: FractionKind,
        value: f64,
    },

    #[error("Cannot score a probe without oligos")]
    EmptyProbe,
}

/// How the joint probability of "hybridized, not folded, not out-competed" is
/// approximated from the marginal fractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoodnessModel {
    /// Frechet lower bound `max(0, sum(p_i) - (n - 1))`.
    #[default]
    LowerBound,
    /// Product of the marginals, assuming independence.
    Independent,
}

impl FromStr for GoodnessModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lower-bound" => Ok(GoodnessModel::LowerBound),
            "independent" => Ok(GoodnessModel::Independent),
            other => Err(format!(
                "Unknown goodness model '{}'. Expected 'lower-bound' or 'independent'",
                other
            )),
        }
    }
}

impl GoodnessModel {
    pub fn goodness(&self, hybridization: f64, fold: f64, bystander: Option<f64>) -> f64 {
        match self {
            GoodnessModel::LowerBound => {
                let joint = hybridization - fold - bystander.unwrap_or(0.0);
                joint.max(0.0)
            }
            GoodnessModel::Independent => {
                hybridization * (1.0 - fold) * (1.0 - bystander.unwrap_or(0.0))
            }
        }
    }
}

/// Turns melt tables into condition scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreEngine {
    model: GoodnessModel,
}

impl ScoreEngine {
    pub fn new(model: GoodnessModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> GoodnessModel {
        self.model
    }

    /// Scores every oligo in `oligos` at one temperature.
    ///
    /// `melt` must hold both fractions for every oligo. When `bystander` is given it
    /// must hold a hybridization fraction for every oligo too. Entries for names not
    /// in `oligos` are ignored.
    pub fn score<'a, I>(
        &self,
        temperature: f64,
        oligos: I,
        melt: &MeltTable,
        bystander: Option<&MeltTable>,
    ) -> Result<ConditionScore, ScoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut scores = Vec::new();
        for name in oligos {
            let hybridization = fraction(
                name,
                FractionKind::Hybridization,
                melt.hybridization.get(name),
            )?;
            let fold = fraction(name, FractionKind::Fold, melt.fold.get(name))?;
            let competing = bystander
                .map(|table| {
                    fraction(
                        name,
                        FractionKind::Bystander,
                        table.hybridization.get(name),
                    )
                })
                .transpose()?;

            scores.push(OligoScore {
                name: name.to_string(),
                hybridization,
                fold,
                bystander: competing,
                goodness: self.model.goodness(hybridization, fold, competing),
            });
        }

        if scores.is_empty() {
            return Err(ScoreError::EmptyProbe);
        }

        let raw_score: f64 = scores.iter().map(|s| s.goodness).sum();
        Ok(ConditionScore {
            temperature,
            raw_score,
            normalized_score: round_to(raw_score / scores.len() as f64, 2),
            oligos: scores,
        })
    }
}

fn fraction(oligo: &str, kind: FractionKind, value: Option<&f64>) -> Result<f64, ScoreError> {
    let value = *value.ok_or_else(|| ScoreError::MissingFraction {
        oligo: oligo.to_string(),
        kind,
    })?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ScoreError::OutOfRange {
            oligo: oligo.to_string(),
            kind,
            value,
        })
    }
}
