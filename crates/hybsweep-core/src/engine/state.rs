use super::config::{Stage, StageConfig};
use crate::core::utils::numeric::approx_eq;

/// Scoring breakdown of one oligo at one condition.
#[derive(Debug, Clone, PartialEq)]
pub struct OligoScore {
    pub name: String,
    pub hybridization: f64,
    pub fold: f64,
    /// Hybridization fraction of the competing duplex, H2 only.
    pub bystander: Option<f64>,
    pub goodness: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionScore {
    pub temperature: f64,
    /// Sum of per-oligo goodness.
    pub raw_score: f64,
    /// `raw_score / oligo count`, rounded to 2 decimals.
    pub normalized_score: f64,
    pub oligos: Vec<OligoScore>,
}

impl ConditionScore {
    pub fn oligo_count(&self) -> usize {
        self.oligos.len()
    }

    /// The oligo with the lowest goodness; the first one wins ties.
    pub fn weakest(&self) -> Option<&OligoScore> {
        self.oligos.iter().reduce(|weakest, candidate| {
            if candidate.goodness < weakest.goodness {
                candidate
            } else {
                weakest
            }
        })
    }
}

/// Condition scores of one sweep, in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreLedger {
    entries: Vec<ConditionScore>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, score: ConditionScore) {
        self.entries.push(score);
    }

    pub fn entries(&self) -> &[ConditionScore] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConditionScore> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.temperature).collect()
    }

    pub fn get(&self, temperature: f64) -> Option<&ConditionScore> {
        self.entries
            .iter()
            .find(|e| approx_eq(e.temperature, temperature))
    }
}

impl FromIterator<ConditionScore> for ScoreLedger {
    fn from_iter<I: IntoIterator<Item = ConditionScore>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ScoreLedger {
    type Item = &'a ConditionScore;
    type IntoIter = std::slice::Iter<'a, ConditionScore>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// The selected condition of a stage. Only ever built from a complete ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct BestCondition {
    pub score: ConditionScore,
    pub equivalent_formamide: f64,
}

impl BestCondition {
    pub fn temperature(&self) -> f64 {
        self.score.temperature
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub config: StageConfig,
    pub ledger: ScoreLedger,
    pub best: BestCondition,
}

impl StageResult {
    pub fn stage(&self) -> Stage {
        self.config.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oligo(name: &str, goodness: f64) -> OligoScore {
        OligoScore {
            name: name.to_string(),
            hybridization: goodness,
            fold: 0.0,
            bystander: None,
            goodness,
        }
    }

    fn score(temperature: f64, raw_score: f64) -> ConditionScore {
        ConditionScore {
            temperature,
            raw_score,
            normalized_score: raw_score,
            oligos: vec![oligo("a", raw_score)],
        }
    }

    #[test]
    fn weakest_picks_first_minimum() {
        let score = ConditionScore {
            temperature: 37.0,
            raw_score: 1.5,
            normalized_score: 0.5,
            oligos: vec![oligo("a", 0.9), oligo("b", 0.3), oligo("c", 0.3)],
        };
        assert_eq!(score.weakest().map(|o| o.name.as_str()), Some("b"));
        assert_eq!(score.oligo_count(), 3);

        let empty = ConditionScore {
            oligos: Vec::new(),
            ..score
        };
        assert!(empty.weakest().is_none());
    }

    #[test]
    fn ledger_keeps_recording_order() {
        let ledger: ScoreLedger = [score(37.0, 0.5), score(36.0, 0.7), score(38.0, 0.2)]
            .into_iter()
            .collect();
        assert_eq!(ledger.temperatures(), vec![37.0, 36.0, 38.0]);
        assert_eq!(ledger.get(36.0).map(|s| s.raw_score), Some(0.7));
        assert!(ledger.get(40.0).is_none());
        assert_eq!(ledger.len(), 3);
    }
}
