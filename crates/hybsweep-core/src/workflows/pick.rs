use crate::core::models::oligo::Probe;
use crate::engine::config::{PickConfig, StageConfig, SweepConfig};
use crate::engine::equivalence::equivalent_formamide;
use crate::engine::error::EngineError;
use crate::engine::evaluator::MeltEvaluator;
use crate::engine::explorer::{self, StageContext};
use crate::engine::plan::SweepPlan;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scoring::ScoreEngine;
use crate::engine::selection;
use crate::engine::state::{BestCondition, StageResult};
use crate::engine::workspace::ConditionWorkspace;
use std::path::Path;
use tracing::{info, instrument};

/// The evaluators used by each stage. They may all be the same object.
#[derive(Clone, Copy)]
pub struct Evaluators<'a> {
    pub h1: &'a dyn MeltEvaluator,
    pub h2: &'a dyn MeltEvaluator,
    /// Evaluates the H1 target duplex while the H2 stage is being swept.
    pub bystander: &'a dyn MeltEvaluator,
}

impl<'a> Evaluators<'a> {
    pub fn shared(evaluator: &'a dyn MeltEvaluator) -> Self {
        Self {
            h1: evaluator,
            h2: evaluator,
            bystander: evaluator,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    pub probe: String,
    pub h1: StageResult,
    pub h2: StageResult,
}

impl PickResult {
    pub fn stages(&self) -> [&StageResult; 2] {
        [&self.h1, &self.h2]
    }
}

#[instrument(skip_all, name = "pick_workflow", fields(probe = probe.name()))]
pub fn run(
    probe: &Probe,
    config: &PickConfig,
    evaluators: &Evaluators,
    reporter: &ProgressReporter,
) -> Result<PickResult, EngineError> {
    // === Phase 0: Validation, before anything touches the filesystem ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(
        oligos = probe.len(),
        structure = %probe.structure(),
        "Validating pick configuration"
    );

    let h1_plan = SweepPlan::new(&config.h1.range)?;
    let h2_plan = SweepPlan::new(&config.h2.range)?;
    explorer::check_strategy(&config.sweep.strategy)?;

    for evaluator in [evaluators.h1, evaluators.h2, evaluators.bystander] {
        evaluator
            .preflight()
            .map_err(|source| EngineError::EvaluatorUnavailable {
                evaluator: evaluator.name().to_string(),
                source,
            })?;
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: H1, probe to target ===
    let h1 = run_stage(
        probe,
        &config.h1,
        &h1_plan,
        &config.sweep,
        evaluators.h1,
        evaluators.bystander,
        &config.work_dir,
        reporter,
    )?;

    // === Phase 2: H2, labeled oligo to color flap ===
    let h2 = run_stage(
        probe,
        &config.h2,
        &h2_plan,
        &config.sweep,
        evaluators.h2,
        evaluators.bystander,
        &config.work_dir,
        reporter,
    )?;

    Ok(PickResult {
        probe: probe.name().to_string(),
        h1,
        h2,
    })
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, name = "stage", fields(stage = %config.stage))]
fn run_stage(
    probe: &Probe,
    config: &StageConfig,
    plan: &SweepPlan,
    sweep: &SweepConfig,
    evaluator: &dyn MeltEvaluator,
    bystander_evaluator: &dyn MeltEvaluator,
    work_dir: &Path,
    reporter: &ProgressReporter,
) -> Result<StageResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: config.stage.phase_name(),
    });

    let workspace = ConditionWorkspace::new(work_dir.join(config.stage.label()));
    let context = StageContext::new(
        probe,
        config,
        evaluator,
        bystander_evaluator,
        ScoreEngine::new(sweep.goodness),
        &workspace,
    );

    let ledger = explorer::run(&context, plan, sweep, reporter)?;
    let selected = selection::select(&ledger, plan, sweep.tie_break)?.clone();
    let best = BestCondition {
        equivalent_formamide: equivalent_formamide(
            selected.temperature,
            config.default_temperature(),
            config.default_formamide(),
        ),
        score: selected,
    };

    info!(
        temperature = best.temperature(),
        score = best.score.normalized_score,
        equivalent_formamide = best.equivalent_formamide,
        "Selected condition"
    );
    reporter.report(Progress::PhaseFinish);

    Ok(StageResult {
        config: config.clone(),
        ledger,
        best,
    })
}
