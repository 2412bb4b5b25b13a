use super::error::EngineError;
use super::plan::SweepPlan;
use super::state::{ConditionScore, ScoreLedger};
use crate::core::utils::numeric::approx_eq;
use serde::Deserialize;
use std::cmp::Ordering;
use std::str::FromStr;

/// Which of several equally scored conditions is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// The one visited last by the sequential sweep.
    #[default]
    LastEvaluated,
    /// The one nearest the default temperature, then the colder one.
    ClosestToDefault,
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "last-evaluated" => Ok(TieBreak::LastEvaluated),
            "closest-to-default" => Ok(TieBreak::ClosestToDefault),
            other => Err(format!(
                "Unknown tie-break policy '{}'. Expected 'last-evaluated' or 'closest-to-default'",
                other
            )),
        }
    }
}

struct Candidate<'a> {
    score: &'a ConditionScore,
    rank: usize,
}

impl TieBreak {
    fn prefers(&self, candidate: &Candidate, current: &Candidate, default: f64) -> bool {
        match candidate.score.raw_score.total_cmp(&current.score.raw_score) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match self {
                TieBreak::LastEvaluated => candidate.rank > current.rank,
                TieBreak::ClosestToDefault => {
                    let distance = (candidate.score.temperature - default).abs();
                    let current_distance = (current.score.temperature - default).abs();
                    if approx_eq(distance, current_distance) {
                        candidate.score.temperature < current.score.temperature
                    } else {
                        distance < current_distance
                    }
                }
            },
        }
    }
}

/// Picks the condition with the highest raw score.
///
/// Ties are ranked by the plan's sequential order rather than by ledger position,
/// so a ledger recorded in grid order selects the same entry as a sequential one.
pub fn select<'a>(
    ledger: &'a ScoreLedger,
    plan: &SweepPlan,
    tie_break: TieBreak,
) -> Result<&'a ConditionScore, EngineError> {
    let mut best: Option<Candidate<'a>> = None;

    for score in ledger {
        let rank = plan.rank(score.temperature).ok_or_else(|| {
            EngineError::Internal(format!(
                "Scored temperature {:.4} is not part of the sweep plan",
                score.temperature
            ))
        })?;
        let candidate = Candidate { score, rank };
        best = match best {
            Some(current)
                if !tie_break.prefers(&candidate, &current, plan.default_temperature()) =>
            {
                Some(current)
            }
            _ => Some(candidate),
        };
    }

    best.map(|c| c.score)
        .ok_or_else(|| EngineError::Internal("Cannot select from an empty score ledger".into()))
}
