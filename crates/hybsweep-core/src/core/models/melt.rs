use std::collections::HashMap;

/// The two fractions an evaluator reports for one oligo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeltResult {
    /// Fraction of the oligo duplexed with its intended partner.
    pub hybridization: f64,
    /// Fraction of the oligo engaged in competing secondary structure.
    pub fold: f64,
}

/// Per-oligo fractions returned by one evaluator call, keyed by oligo identifier.
///
/// Duplex and fold fractions are kept in separate maps because they are computed
/// on different sub-sequences, and a call may only ask for one of the two.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeltTable {
    pub hybridization: HashMap<String, f64>,
    pub fold: HashMap<String, f64>,
}

impl MeltTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_hybridization(&mut self, name: impl Into<String>, fraction: f64) {
        self.hybridization.insert(name.into(), fraction);
    }

    pub fn insert_fold(&mut self, name: impl Into<String>, fraction: f64) {
        self.fold.insert(name.into(), fraction);
    }

    pub fn get(&self, name: &str) -> Option<MeltResult> {
        Some(MeltResult {
            hybridization: *self.hybridization.get(name)?,
            fold: *self.fold.get(name)?,
        })
    }

    /// Names present in either map, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .hybridization
            .keys()
            .chain(self.fold.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.hybridization.is_empty() && self.fold.is_empty()
    }
}
