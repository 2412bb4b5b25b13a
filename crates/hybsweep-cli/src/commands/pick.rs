use crate::cli::PickArgs;
use crate::config::{self, AppConfig, EvaluatorSource};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use hybsweep::{
    core::io::fasta,
    core::models::oligo::Probe,
    engine::error::EngineError,
    engine::evaluator::{
        EvaluatorError, command::CommandEvaluator, thermo::ThermoEvaluator,
    },
    engine::progress::ProgressReporter,
    engine::report,
    workflows::{
        self,
        pick::{Evaluators, PickResult},
    },
};
use std::fs;
use std::path::Path;
use tracing::info;

const H1_DUPLEX_TABLE: &str = "h1.duplex.tsv";
const H1_FOLD_TABLE: &str = "h1.fold.tsv";
const H2_DUPLEX_TABLE: &str = "h2.duplex.tsv";
const H2_FOLD_TABLE: &str = "h2.fold.tsv";
const BYSTANDER_DUPLEX_TABLE: &str = "bystander.duplex.tsv";

pub fn run(args: PickArgs, threads: Option<usize>) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = config::build_config(&args, threads)?;

    info!("Loading probe oligos from {:?}", &config.input);
    let records = fasta::read_from_path(&config.input).map_err(|e| CliError::FileParsing {
        path: config.input.clone(),
        source: e.into(),
    })?;
    let probe = Probe::new(config.probe_name.clone(), config.structure, records)
        .map_err(EngineError::from)?;

    println!(
        "Picking hybridization conditions for probe '{}' ({} oligos)...",
        probe.name(),
        probe.len()
    );
    let result = match &config.evaluator {
        EvaluatorSource::Command { program, args } => {
            let evaluator = CommandEvaluator::new(program).with_args(args.clone());
            execute(&probe, &config, Evaluators::shared(&evaluator))?
        }
        EvaluatorSource::Thermo { dir, correction } => {
            let load = |duplex: &str, fold: Option<&str>| {
                ThermoEvaluator::from_paths(
                    &dir.join(duplex),
                    fold.map(|name| dir.join(name)).as_deref(),
                    *correction,
                )
                .map_err(unavailable)
            };
            let h1 = load(H1_DUPLEX_TABLE, Some(H1_FOLD_TABLE))?;
            let h2 = load(H2_DUPLEX_TABLE, Some(H2_FOLD_TABLE))?;
            let bystander = load(BYSTANDER_DUPLEX_TABLE, None)?;
            execute(
                &probe,
                &config,
                Evaluators {
                    h1: &h1,
                    h2: &h2,
                    bystander: &bystander,
                },
            )?
        }
    };

    fs::create_dir_all(&config.output)?;
    let written = write_outputs(&result, &config.output)?;
    for stage in result.stages() {
        println!(
            "✓ {}: {:.2} C (score {:.2}, equivalent formamide {:.2}%)",
            stage.stage(),
            stage.best.temperature(),
            stage.best.score.normalized_score,
            stage.best.equivalent_formamide
        );
    }
    info!("Wrote {} output table(s) to {:?}", written, &config.output);
    Ok(())
}

fn unavailable(source: EvaluatorError) -> CliError {
    CliError::Core(EngineError::EvaluatorUnavailable {
        evaluator: "thermo".to_string(),
        source,
    })
}

fn execute(probe: &Probe, config: &AppConfig, evaluators: Evaluators) -> Result<PickResult> {
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the core pick workflow...");
    Ok(workflows::pick::run(
        probe,
        &config.pick,
        &evaluators,
        &reporter,
    )?)
}

fn write_outputs(result: &PickResult, output: &Path) -> Result<usize> {
    let written = report::write_stage_outputs(&result.probe, &result.stages(), output).map_err(
        |source| EngineError::Artifact {
            path: output.to_path_buf(),
            source,
        },
    )?;
    for path in &written {
        info!("Wrote {:?}", path);
    }
    Ok(written.len())
}
