use super::config::{EarlyStop, Stage, StageConfig, SweepConfig, SweepStrategy};
use super::error::EngineError;
use super::evaluator::{MeltEvaluator, MeltRequest};
use super::plan::SweepPlan;
use super::progress::{Progress, ProgressReporter};
use super::report::{self, OLIGO_SCORES_FILE};
use super::scoring::ScoreEngine;
use super::state::{ConditionScore, ScoreLedger};
use super::workspace::ConditionWorkspace;
use crate::core::models::condition::Condition;
use crate::core::models::oligo::{Probe, SequenceRecord};
use rayon::prelude::*;
use std::thread;
use tracing::{debug, error, info, instrument, warn};

/// Sequences and evaluator of the competing duplex.
pub struct BystanderContext<'a> {
    pub condition: Condition,
    pub records: Vec<SequenceRecord>,
    pub evaluator: &'a dyn MeltEvaluator,
}

/// Everything needed to score one stage at any temperature. Read-only once built,
/// so it can be shared by the workers of a parallel sweep.
pub struct StageContext<'a> {
    pub stage: Stage,
    pub condition: Condition,
    pub oligo_ids: Vec<String>,
    pub duplex: Vec<SequenceRecord>,
    pub fold: Vec<SequenceRecord>,
    pub evaluator: &'a dyn MeltEvaluator,
    pub bystander: Option<BystanderContext<'a>>,
    pub scorer: ScoreEngine,
    pub workspace: &'a ConditionWorkspace,
}

impl<'a> StageContext<'a> {
    pub fn new(
        probe: &Probe,
        config: &StageConfig,
        evaluator: &'a dyn MeltEvaluator,
        bystander_evaluator: &'a dyn MeltEvaluator,
        scorer: ScoreEngine,
        workspace: &'a ConditionWorkspace,
    ) -> Self {
        let stage = config.stage;
        let bystander = config
            .bystander_condition()
            .zip(stage.bystander_subset())
            .map(|(condition, subset)| BystanderContext {
                condition,
                records: probe.records(subset),
                evaluator: bystander_evaluator,
            });

        Self {
            stage,
            condition: config.condition,
            oligo_ids: probe.oligo_ids().map(str::to_string).collect(),
            duplex: probe.records(stage.duplex_subset()),
            fold: probe.records(stage.fold_subset()),
            evaluator,
            bystander,
            scorer,
            workspace,
        }
    }

    /// Evaluates and scores the stage at `temperature`.
    ///
    /// Artifacts go to the namespace of the derived condition, plus a nested
    /// directory for the bystander evaluation.
    pub fn evaluate_at(&self, temperature: f64) -> Result<ConditionScore, EngineError> {
        let condition = self.condition.at_temperature(temperature);
        let namespace = self.workspace.prepare(&condition)?;
        let external = |source| EngineError::ExternalTool {
            temperature,
            source,
        };

        let melt = self
            .evaluator
            .evaluate(&MeltRequest {
                condition: &condition,
                duplex: &self.duplex,
                fold: &self.fold,
                namespace: &namespace,
            })
            .map_err(external)?;

        let competing = match &self.bystander {
            Some(bystander) => {
                let condition = bystander.condition.at_temperature(temperature);
                let nested = self.workspace.prepare_bystander(&namespace)?;
                let table = bystander
                    .evaluator
                    .evaluate(&MeltRequest {
                        condition: &condition,
                        duplex: &bystander.records,
                        fold: &[],
                        namespace: &nested,
                    })
                    .map_err(external)?;
                Some(table)
            }
            None => None,
        };

        let score = self
            .scorer
            .score(
                temperature,
                self.oligo_ids.iter().map(String::as_str),
                &melt,
                competing.as_ref(),
            )
            .map_err(|source| EngineError::ScoreComputation {
                temperature,
                source,
            })?;

        let path = namespace.join(OLIGO_SCORES_FILE);
        report::write_oligo_scores(&score, &path)
            .map_err(|source| EngineError::Artifact { path, source })?;

        if let Some(weakest) = score.weakest() {
            debug!(
                stage = %self.stage,
                temperature,
                raw_score = score.raw_score,
                normalized_score = score.normalized_score,
                weakest = %weakest.name,
                weakest_goodness = weakest.goodness,
                "Scored condition"
            );
        }
        Ok(score)
    }
}

/// Rejects thread counts the machine cannot honor.
pub fn check_strategy(strategy: &SweepStrategy) -> Result<(), EngineError> {
    if let SweepStrategy::Parallel { threads } = *strategy {
        let available = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if threads > available {
            return Err(EngineError::ConcurrencyLimit {
                requested: threads,
                available,
            });
        }
    }
    Ok(())
}

/// Evaluates every planned temperature of one stage and returns the ledger.
///
/// The sequential strategy records the default first, then the downward walk,
/// then the upward walk, and stops at the first failure. The parallel strategy
/// records the grid in ascending order and fails after all workers finish if any
/// of them failed.
#[instrument(skip_all, name = "condition_sweep", fields(stage = %context.stage))]
pub fn run(
    context: &StageContext,
    plan: &SweepPlan,
    config: &SweepConfig,
    reporter: &ProgressReporter,
) -> Result<ScoreLedger, EngineError> {
    info!(
        points = plan.len(),
        default = plan.default_temperature(),
        strategy = ?config.strategy,
        "Starting temperature sweep"
    );
    reporter.report(Progress::TaskStart {
        total_steps: plan.len() as u64,
    });

    let ledger = match config.strategy {
        SweepStrategy::Sequential => sweep_sequential(context, plan, config.early_stop, reporter),
        SweepStrategy::Parallel { threads } => {
            if config.early_stop.is_some() {
                warn!("Early stop only applies to sequential sweeps; evaluating the whole grid");
            }
            check_strategy(&config.strategy)?;
            sweep_parallel(context, plan, threads, reporter)
        }
    }?;

    reporter.report(Progress::TaskFinish);
    info!(evaluated = ledger.len(), "Temperature sweep complete");
    Ok(ledger)
}

fn evaluate(
    context: &StageContext,
    temperature: f64,
    reporter: &ProgressReporter,
) -> Result<ConditionScore, EngineError> {
    let score = context.evaluate_at(temperature)?;
    reporter.report(Progress::ConditionScored {
        stage: context.stage,
        temperature,
        normalized_score: score.normalized_score,
    });
    reporter.report(Progress::TaskIncrement);
    Ok(score)
}

fn sweep_sequential(
    context: &StageContext,
    plan: &SweepPlan,
    early_stop: Option<EarlyStop>,
    reporter: &ProgressReporter,
) -> Result<ScoreLedger, EngineError> {
    let mut ledger = ScoreLedger::new();
    let first = evaluate(context, plan.default_temperature(), reporter)?;
    let mut best = first.raw_score;
    ledger.push(first);

    for direction in [plan.downward(), plan.upward()] {
        let mut stale = 0;
        for &temperature in direction {
            let score = evaluate(context, temperature, reporter)?;
            if score.raw_score > best {
                best = score.raw_score;
                stale = 0;
            } else {
                stale += 1;
            }
            ledger.push(score);

            if let Some(EarlyStop { patience }) = early_stop {
                if stale >= patience {
                    debug!(temperature, patience, "No improvement, leaving this direction");
                    break;
                }
            }
        }
    }
    Ok(ledger)
}

fn sweep_parallel(
    context: &StageContext,
    plan: &SweepPlan,
    threads: usize,
    reporter: &ProgressReporter,
) -> Result<ScoreLedger, EngineError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("hybsweep-worker-{}", i))
        .build()
        .map_err(|e| EngineError::Internal(format!("Failed to build worker pool: {}", e)))?;

    let outcomes: Vec<(f64, Result<ConditionScore, EngineError>)> = pool.install(|| {
        plan.grid_order()
            .par_iter()
            .map(|&temperature| (temperature, evaluate(context, temperature, reporter)))
            .collect()
    });

    let total = outcomes.len();
    let mut ledger = ScoreLedger::new();
    let mut failed = Vec::new();
    let mut first_error = None;
    for (temperature, outcome) in outcomes {
        match outcome {
            Ok(score) => ledger.push(score),
            Err(e) => {
                error!(temperature, error = %e, "Condition evaluation failed");
                failed.push(temperature);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(source) => Err(EngineError::SweepFailed {
            failed,
            total,
            source: Box::new(source),
        }),
        None => Ok(ledger),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::melt::MeltTable;
    use crate::core::models::structure::Structure;
    use crate::engine::config::{BystanderConfig, StageConfigBuilder};
    use crate::engine::evaluator::EvaluatorError;
    use crate::core::io::tsv;
    use crate::engine::scoring::GoodnessModel;
    use crate::engine::selection::{self, TieBreak};
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Hybridization peaks at `peak`, fold is constant.
    struct PeakEvaluator {
        peak: f64,
        fail_at: Option<f64>,
    }

    impl MeltEvaluator for PeakEvaluator {
        fn name(&self) -> &str {
            "peak"
        }

        fn evaluate(&self, request: &MeltRequest) -> Result<MeltTable, EvaluatorError> {
            let t = request.condition.temperature;
            if self.fail_at == Some(t) {
                return Err(EvaluatorError::MissingArtifact {
                    path: request.namespace.join("melt.tsv"),
                });
            }
            let mut table = MeltTable::new();
            let hybridization = (1.0 - (t - self.peak).abs() / 10.0).max(0.0);
            for record in request.duplex {
                table.insert_hybridization(record.name.as_str(), hybridization);
            }
            for record in request.fold {
                table.insert_fold(record.name.as_str(), 0.05);
            }
            Ok(table)
        }
    }

    /// Like [`PeakEvaluator`], but round-trips its table through the condition
    /// namespace the way an external program would.
    struct ArtifactEvaluator {
        peak: f64,
    }

    impl MeltEvaluator for ArtifactEvaluator {
        fn name(&self) -> &str {
            "artifact"
        }

        fn evaluate(&self, request: &MeltRequest) -> Result<MeltTable, EvaluatorError> {
            let table = PeakEvaluator {
                peak: self.peak,
                fail_at: None,
            }
            .evaluate(request)?;
            let path = request.namespace.join("melt.tsv");
            let malformed = |source| EvaluatorError::MalformedArtifact {
                path: path.clone(),
                source,
            };
            tsv::write_melt_table(&table, &path).map_err(malformed)?;
            thread::sleep(Duration::from_millis(2));
            tsv::read_melt_table(&path).map_err(malformed)
        }
    }

    struct ConstantEvaluator(f64);

    impl MeltEvaluator for ConstantEvaluator {
        fn name(&self) -> &str {
            "constant"
        }

        fn evaluate(&self, request: &MeltRequest) -> Result<MeltTable, EvaluatorError> {
            let mut table = MeltTable::new();
            for record in request.duplex {
                table.insert_hybridization(record.name.as_str(), self.0);
            }
            Ok(table)
        }
    }

    fn probe() -> Probe {
        Probe::new(
            "probe",
            "2,3,4,1".parse::<Structure>().unwrap(),
            vec![
                SequenceRecord::new("o1", "CCAAATTTTG"),
                SequenceRecord::new("o2", "GGCCCAAAAT"),
            ],
        )
        .unwrap()
    }

    fn stage_config(stage: Stage, min: f64, max: f64) -> StageConfig {
        let builder = StageConfigBuilder::new(stage)
            .temperature(37.0)
            .step(1.0)
            .min(min)
            .max(max)
            .formamide(25.0)
            .sodium(0.3)
            .concentration(1e-6);
        let builder = match stage {
            Stage::H1 => builder,
            Stage::H2 => builder.bystander(BystanderConfig {
                duplex_type: Default::default(),
                concentration: 1e-6,
            }),
        };
        builder.build().unwrap()
    }

    fn fine_stage_config(temperature: f64, min: f64, max: f64) -> StageConfig {
        StageConfigBuilder::new(Stage::H1)
            .temperature(temperature)
            .step(0.001)
            .min(min)
            .max(max)
            .formamide(25.0)
            .sodium(0.3)
            .concentration(1e-6)
            .build()
            .unwrap()
    }

    fn sweep(
        evaluator: &dyn MeltEvaluator,
        config: &StageConfig,
        strategy: SweepStrategy,
        early_stop: Option<EarlyStop>,
    ) -> Result<ScoreLedger, EngineError> {
        let dir = tempfile::tempdir().unwrap();
        sweep_in(dir.path(), evaluator, config, strategy, early_stop)
    }

    fn sweep_in(
        root: &Path,
        evaluator: &dyn MeltEvaluator,
        config: &StageConfig,
        strategy: SweepStrategy,
        early_stop: Option<EarlyStop>,
    ) -> Result<ScoreLedger, EngineError> {
        let workspace = ConditionWorkspace::new(root);
        let bystander = ConstantEvaluator(0.1);
        let context = StageContext::new(
            &probe(),
            config,
            evaluator,
            &bystander,
            ScoreEngine::new(GoodnessModel::LowerBound),
            &workspace,
        );
        let plan = SweepPlan::new(&config.range).unwrap();
        let sweep = SweepConfig {
            strategy,
            early_stop,
            ..Default::default()
        };
        run(&context, &plan, &sweep, &ProgressReporter::new())
    }

    #[test]
    fn sequential_sweep_records_evaluation_order() {
        let evaluator = PeakEvaluator {
            peak: 35.0,
            fail_at: None,
        };
        let config = stage_config(Stage::H1, 34.0, 39.0);
        let ledger = sweep(&evaluator, &config, SweepStrategy::Sequential, None).unwrap();
        assert_eq!(ledger.temperatures(), vec![37.0, 36.0, 35.0, 34.0, 38.0, 39.0]);
    }

    #[test]
    fn parallel_sweep_records_grid_order_with_same_scores() {
        let evaluator = PeakEvaluator {
            peak: 35.0,
            fail_at: None,
        };
        let config = stage_config(Stage::H1, 34.0, 39.0);
        let sequential = sweep(&evaluator, &config, SweepStrategy::Sequential, None).unwrap();
        let parallel =
            sweep(&evaluator, &config, SweepStrategy::Parallel { threads: 1 }, None).unwrap();

        assert_eq!(parallel.temperatures(), vec![34.0, 35.0, 36.0, 37.0, 38.0, 39.0]);
        for entry in &sequential {
            assert_eq!(parallel.get(entry.temperature), Some(entry));
        }
    }

    #[test]
    fn multi_threaded_sweep_matches_sequential_ledger_and_selection() {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(4);
        let evaluator = ArtifactEvaluator { peak: 37.005 };
        let config = fine_stage_config(37.008, 37.0, 37.016);
        let plan = SweepPlan::new(&config.range).unwrap();

        let sequential = sweep(&evaluator, &config, SweepStrategy::Sequential, None).unwrap();
        let parallel =
            sweep(&evaluator, &config, SweepStrategy::Parallel { threads }, None).unwrap();

        assert_eq!(sequential.len(), 17);
        assert_eq!(parallel.len(), sequential.len());
        for entry in &sequential {
            assert_eq!(parallel.get(entry.temperature), Some(entry));
        }

        for tie_break in [TieBreak::LastEvaluated, TieBreak::ClosestToDefault] {
            let from_sequential = selection::select(&sequential, &plan, tie_break).unwrap();
            let from_parallel = selection::select(&parallel, &plan, tie_break).unwrap();
            assert_eq!(from_sequential.temperature, 37.005);
            assert_eq!(
                (from_parallel.temperature, from_parallel.raw_score),
                (from_sequential.temperature, from_sequential.raw_score)
            );
        }
    }

    #[test]
    fn millidegree_steps_write_to_separate_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let evaluator = ArtifactEvaluator { peak: 37.002 };
        let config = fine_stage_config(37.0, 37.0, 37.004);
        let ledger =
            sweep_in(dir.path(), &evaluator, &config, SweepStrategy::Sequential, None).unwrap();
        assert_eq!(ledger.len(), 5);

        let namespaces = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| entry.as_ref().unwrap().path().is_dir())
            .count();
        assert_eq!(namespaces, 5);
        let workspace = ConditionWorkspace::new(dir.path());
        for &t in &[37.0, 37.001, 37.002, 37.003, 37.004] {
            let namespace = workspace.namespace(&config.condition.at_temperature(t));
            assert!(namespace.join(OLIGO_SCORES_FILE).is_file());
        }
    }

    #[test]
    fn early_stop_abandons_unpromising_directions() {
        let evaluator = PeakEvaluator {
            peak: 37.0,
            fail_at: None,
        };
        let config = stage_config(Stage::H1, 30.0, 44.0);
        let full = sweep(&evaluator, &config, SweepStrategy::Sequential, None).unwrap();
        assert_eq!(full.len(), 15);

        let stopped = sweep(
            &evaluator,
            &config,
            SweepStrategy::Sequential,
            Some(EarlyStop { patience: 2 }),
        )
        .unwrap();
        assert_eq!(stopped.temperatures(), vec![37.0, 36.0, 35.0, 38.0, 39.0]);
    }

    #[test]
    fn sequential_sweep_aborts_on_first_failure() {
        let evaluator = PeakEvaluator {
            peak: 37.0,
            fail_at: Some(36.0),
        };
        let config = stage_config(Stage::H1, 35.0, 39.0);
        let err = sweep(&evaluator, &config, SweepStrategy::Sequential, None).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ExternalTool { temperature, .. } if temperature == 36.0
        ));
    }

    #[test]
    fn parallel_failures_are_not_scores() {
        let evaluator = PeakEvaluator {
            peak: 37.0,
            fail_at: Some(38.0),
        };
        let config = stage_config(Stage::H1, 35.0, 39.0);
        let err = sweep(&evaluator, &config, SweepStrategy::Parallel { threads: 1 }, None)
            .unwrap_err();
        match err {
            EngineError::SweepFailed {
                failed,
                total,
                source,
            } => {
                assert_eq!(failed, vec![38.0]);
                assert_eq!(total, 5);
                assert!(source.is_external_tool());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn h2_scores_include_the_bystander_term() {
        let evaluator = PeakEvaluator {
            peak: 37.0,
            fail_at: None,
        };
        let config = stage_config(Stage::H2, 37.0, 37.0);
        let ledger = sweep(&evaluator, &config, SweepStrategy::Sequential, None).unwrap();
        let score = &ledger.entries()[0];
        assert_eq!(score.oligos[0].bystander, Some(0.1));
        assert!((score.raw_score - 2.0 * (1.0 - 0.05 - 0.1)).abs() < 1e-9);
    }

    #[test]
    fn evaluate_at_writes_oligo_scores_in_condition_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = ConditionWorkspace::new(dir.path());
        let evaluator = PeakEvaluator {
            peak: 37.0,
            fail_at: None,
        };
        let config = stage_config(Stage::H1, 35.0, 39.0);
        let context = StageContext::new(
            &probe(),
            &config,
            &evaluator,
            &evaluator,
            ScoreEngine::default(),
            &workspace,
        );

        context.evaluate_at(36.0).unwrap();
        let namespace = workspace.namespace(&config.condition.at_temperature(36.0));
        assert!(namespace.join(OLIGO_SCORES_FILE).is_file());
    }

    #[test]
    fn progress_events_cover_every_condition() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = ConditionWorkspace::new(dir.path());
        let evaluator = PeakEvaluator {
            peak: 37.0,
            fail_at: None,
        };
        let config = stage_config(Stage::H1, 35.0, 39.0);
        let context = StageContext::new(
            &probe(),
            &config,
            &evaluator,
            &evaluator,
            ScoreEngine::default(),
            &workspace,
        );
        let plan = SweepPlan::new(&config.range).unwrap();
        let scored = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::ConditionScored { temperature, .. } = event {
                scored.lock().unwrap().push(temperature);
            }
        }));

        let sweep = SweepConfig {
            strategy: SweepStrategy::Parallel { threads: 1 },
            ..Default::default()
        };
        run(&context, &plan, &sweep, &reporter).unwrap();
        drop(reporter);

        let mut seen = scored.into_inner().unwrap();
        seen.sort_by(f64::total_cmp);
        assert_eq!(seen, vec![35.0, 36.0, 37.0, 38.0, 39.0]);
    }

    #[test]
    fn thread_counts_above_available_parallelism_are_rejected() {
        let available = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert!(check_strategy(&SweepStrategy::Parallel { threads: available }).is_ok());
        assert!(matches!(
            check_strategy(&SweepStrategy::Parallel {
                threads: available + 1
            }),
            Err(EngineError::ConcurrencyLimit { requested, .. }) if requested == available + 1
        ));
        assert!(check_strategy(&SweepStrategy::Sequential).is_ok());
    }
}
