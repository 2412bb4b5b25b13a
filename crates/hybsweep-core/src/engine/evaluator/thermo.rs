use super::{EvaluatorError, MELT_ARTIFACT, MeltEvaluator, MeltRequest};
use crate::core::io::tsv;
use crate::core::models::melt::MeltTable;
use crate::core::models::oligo::SequenceRecord;
use crate::core::thermo::{self, FormamideCorrection, ThermoParams};
use std::collections::HashMap;
use std::path::Path;

/// Computes fractions from precomputed dH/dS tables with a two-state model.
///
/// Tables are keyed by sequence name. The duplex table describes the duplexes the
/// evaluator will be asked about (a table is specific to a duplex type, so the
/// condition's duplex type is not consulted). The fold table is only needed when
/// requests carry fold sequences.
#[derive(Debug, Clone)]
pub struct ThermoEvaluator {
    duplex: HashMap<String, ThermoParams>,
    fold: HashMap<String, ThermoParams>,
    correction: FormamideCorrection,
}

impl ThermoEvaluator {
    pub fn new(
        duplex: HashMap<String, ThermoParams>,
        fold: HashMap<String, ThermoParams>,
        correction: FormamideCorrection,
    ) -> Self {
        Self {
            duplex,
            fold,
            correction,
        }
    }

    pub fn from_paths(
        duplex: &Path,
        fold: Option<&Path>,
        correction: FormamideCorrection,
    ) -> Result<Self, EvaluatorError> {
        let read = |path: &Path| {
            tsv::read_thermo_table(path).map_err(|source| EvaluatorError::Table {
                path: path.to_path_buf(),
                source,
            })
        };
        let duplex = read(duplex)?;
        let fold = fold.map(read).transpose()?.unwrap_or_default();
        Ok(Self::new(duplex, fold, correction))
    }

    fn lookup<'a>(
        table: &'a HashMap<String, ThermoParams>,
        record: &SequenceRecord,
        role: &'static str,
    ) -> Result<&'a ThermoParams, EvaluatorError> {
        table
            .get(&record.name)
            .ok_or_else(|| EvaluatorError::MissingParameters {
                name: record.name.clone(),
                role,
            })
    }
}

impl MeltEvaluator for ThermoEvaluator {
    fn name(&self) -> &str {
        "thermo"
    }

    fn evaluate(&self, request: &MeltRequest) -> Result<MeltTable, EvaluatorError> {
        let mut table = MeltTable::new();

        for record in request.duplex {
            let params = Self::lookup(&self.duplex, record, "duplex")?;
            let fraction = thermo::hybridized_fraction(
                *params,
                record.sequence.len(),
                request.condition,
                &self.correction,
            );
            table.insert_hybridization(record.name.as_str(), fraction);
        }

        for record in request.fold {
            let params = Self::lookup(&self.fold, record, "fold")?;
            let fraction = thermo::folded_fraction(
                *params,
                record.sequence.len(),
                request.condition,
                &self.correction,
            );
            table.insert_fold(record.name.as_str(), fraction);
        }

        let artifact = request.namespace.join(MELT_ARTIFACT);
        tsv::write_melt_table(&table, &artifact).map_err(|source| EvaluatorError::Table {
            path: artifact,
            source,
        })?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::condition::{Condition, DuplexType};
    use std::fs;

    fn condition(temperature: f64) -> Condition {
        Condition {
            temperature,
            formamide: 0.0,
            sodium: 1.0,
            magnesium: 0.0,
            duplex_type: DuplexType::DnaDna,
            concentration: 1e-6,
        }
    }

    fn evaluator() -> ThermoEvaluator {
        let duplex = HashMap::from([(
            "o1".to_string(),
            ThermoParams {
                enthalpy: -200.0,
                entropy: -550.0,
            },
        )]);
        let fold = HashMap::from([(
            "o1".to_string(),
            ThermoParams {
                enthalpy: -30.0,
                entropy: -100.0,
            },
        )]);
        ThermoEvaluator::new(duplex, fold, FormamideCorrection::default())
    }

    #[test]
    fn computes_fractions_and_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let duplex = vec![SequenceRecord::new("o1", "ACGTACGTACGTACGTACGT")];
        let fold = duplex.clone();
        let condition = condition(40.0);

        let table = evaluator()
            .evaluate(&MeltRequest {
                condition: &condition,
                duplex: &duplex,
                fold: &fold,
                namespace: dir.path(),
            })
            .unwrap();

        let result = table.get("o1").unwrap();
        assert!(result.hybridization > 0.99);
        assert!((0.0..=1.0).contains(&result.fold));

        let written = tsv::read_melt_table(dir.path().join(MELT_ARTIFACT)).unwrap();
        assert_eq!(written.names(), vec!["o1"]);
    }

    #[test]
    fn duplex_only_requests_leave_fold_empty() {
        let dir = tempfile::tempdir().unwrap();
        let duplex = vec![SequenceRecord::new("o1", "ACGTACGTACGTACGTACGT")];
        let condition = condition(40.0);

        let table = evaluator()
            .evaluate(&MeltRequest {
                condition: &condition,
                duplex: &duplex,
                fold: &[],
                namespace: dir.path(),
            })
            .unwrap();
        assert!(table.hybridization.contains_key("o1"));
        assert!(table.fold.is_empty());
    }

    #[test]
    fn unknown_sequences_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let duplex = vec![SequenceRecord::new("o9", "ACGT")];
        let condition = condition(40.0);

        let err = evaluator()
            .evaluate(&MeltRequest {
                condition: &condition,
                duplex: &duplex,
                fold: &[],
                namespace: dir.path(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            EvaluatorError::MissingParameters { ref name, role: "duplex" } if name == "o9"
        ));
    }

    #[test]
    fn tables_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let duplex = dir.path().join("duplex.tsv");
        fs::write(&duplex, "name\tdH\tdS\no1\t-200\t-550\n").unwrap();

        let evaluator =
            ThermoEvaluator::from_paths(&duplex, None, FormamideCorrection::default()).unwrap();
        assert!(evaluator.fold.is_empty());
        assert_eq!(evaluator.duplex.len(), 1);

        let missing = dir.path().join("absent.tsv");
        assert!(matches!(
            ThermoEvaluator::from_paths(&duplex, Some(&missing), FormamideCorrection::default()),
            Err(EvaluatorError::Table { .. })
        ));
    }
}
