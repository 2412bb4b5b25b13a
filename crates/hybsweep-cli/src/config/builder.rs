use super::defaults::{DefaultsConfig, StageDefaults};
use super::file::{FileBystanderConfig, FileConfig, FileStageConfig};
use super::models::{AppConfig, EvaluatorSource};
use crate::cli::{H1Args, H2Args, PickArgs};
use crate::error::{CliError, Result};
use hybsweep::core::models::condition::DuplexType;
use hybsweep::core::models::structure::Structure;
use hybsweep::core::thermo::{FormamideCorrection, MValue};
use hybsweep::engine::config::{
    self as core_config, BystanderConfig, EarlyStop, PickConfigBuilder, Stage,
    StageConfigBuilder, SweepStrategy,
};
use std::path::Path;
use std::str::FromStr;
use std::thread;
use tracing::{debug, warn};

/// Stage values given on the command line, shaped like a config file section.
struct StageOverrides<'a> {
    values: FileStageConfig,
    duplex_type: Option<&'a str>,
}

impl<'a> From<&'a H1Args> for StageOverrides<'a> {
    fn from(args: &'a H1Args) -> Self {
        Self {
            values: FileStageConfig {
                temperature: args.temperature,
                step: args.step,
                min: args.min,
                max: args.max,
                formamide: args.formamide,
                sodium: args.sodium,
                magnesium: args.magnesium,
                duplex_type: None,
                concentration: args.concentration,
            },
            duplex_type: args.duplex_type.as_deref(),
        }
    }
}

impl<'a> From<&'a H2Args> for StageOverrides<'a> {
    fn from(args: &'a H2Args) -> Self {
        Self {
            values: FileStageConfig {
                temperature: args.temperature,
                step: args.step,
                min: args.min,
                max: args.max,
                formamide: args.formamide,
                sodium: args.sodium,
                magnesium: args.magnesium,
                duplex_type: None,
                concentration: args.concentration,
            },
            duplex_type: args.duplex_type.as_deref(),
        }
    }
}

/// Merges CLI arguments, `-S` overrides, the config file and built-in defaults,
/// in that order of precedence.
pub fn build_config(args: &PickArgs, threads: Option<usize>) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let raw_structure = args
        .structure
        .as_deref()
        .or(file_config.structure.as_deref())
        .ok_or_else(|| {
            CliError::Config(
                "A probe structure is required either in the config file or via --structure."
                    .to_string(),
            )
        })?;
    let structure = Structure::from_str(raw_structure)
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let probe_name = match &args.name {
        Some(name) => name.clone(),
        None => probe_name_from_path(&args.input)?,
    };

    let bystander_file = file_config.bystander.take().unwrap_or_default();
    let bystander = BystanderConfig {
        duplex_type: match args.h2.bystander_duplex_type.as_deref() {
            Some(raw) => parse_duplex_type(raw)?,
            None => bystander_file
                .duplex_type
                .unwrap_or(defaults.bystander_duplex_type),
        },
        concentration: args
            .h2
            .bystander_concentration
            .or(bystander_file.concentration)
            .unwrap_or(defaults.bystander_concentration),
    };

    let h1 = build_stage(
        StageConfigBuilder::new(Stage::H1),
        StageOverrides::from(&args.h1),
        file_config.h1.take().unwrap_or_default(),
        &defaults.h1,
    )?;
    let h2 = build_stage(
        StageConfigBuilder::new(Stage::H2).bystander(bystander),
        StageOverrides::from(&args.h2),
        file_config.h2.take().unwrap_or_default(),
        &defaults.h2,
    )?;

    let sweep_file = file_config.sweep.take().unwrap_or_default();
    let parallel = args.parallel || sweep_file.parallel.unwrap_or(defaults.parallel);
    let threads = threads.or(sweep_file.threads);
    let strategy = if parallel {
        SweepStrategy::Parallel {
            threads: threads.unwrap_or_else(available_threads),
        }
    } else {
        if threads.is_some() {
            warn!("A thread count was given without --parallel; the sweep stays sequential.");
        }
        SweepStrategy::Sequential
    };

    let tie_break = match &args.tie_break {
        Some(raw) => raw.parse().map_err(CliError::Argument)?,
        None => sweep_file.tie_break.unwrap_or(defaults.tie_break),
    };
    let goodness = match &args.goodness {
        Some(raw) => raw.parse().map_err(CliError::Argument)?,
        None => sweep_file.goodness.unwrap_or(defaults.goodness),
    };
    let early_stop = args
        .early_stop
        .or(sweep_file.early_stop)
        .map(|patience| EarlyStop { patience });

    let evaluator = resolve_evaluator(args, file_config, &defaults)?;

    let pick = PickConfigBuilder::new()
        .h1(h1)
        .h2(h2)
        .strategy(strategy)
        .early_stop(early_stop)
        .tie_break(tie_break)
        .goodness(goodness)
        .work_dir(args.output.clone())
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;
    debug!(?pick, "Resolved pick configuration");

    Ok(AppConfig {
        probe_name,
        input: args.input.clone(),
        output: args.output.clone(),
        structure,
        evaluator,
        pick,
    })
}

fn build_stage(
    builder: StageConfigBuilder,
    cli: StageOverrides,
    file: FileStageConfig,
    defaults: &StageDefaults,
) -> Result<core_config::StageConfig> {
    let values = &cli.values;
    let temperature = values
        .temperature
        .or(file.temperature)
        .unwrap_or(defaults.temperature);
    let duplex_type = match cli.duplex_type {
        Some(raw) => parse_duplex_type(raw)?,
        None => file.duplex_type.unwrap_or(defaults.duplex_type),
    };

    builder
        .temperature(temperature)
        .step(values.step.or(file.step).unwrap_or(defaults.step))
        .min(
            values
                .min
                .or(file.min)
                .unwrap_or((temperature - defaults.span).max(0.0)),
        )
        .max(
            values
                .max
                .or(file.max)
                .unwrap_or(temperature + defaults.span),
        )
        .formamide(
            values
                .formamide
                .or(file.formamide)
                .unwrap_or(defaults.formamide),
        )
        .sodium(values.sodium.or(file.sodium).unwrap_or(defaults.sodium))
        .magnesium(
            values
                .magnesium
                .or(file.magnesium)
                .unwrap_or(defaults.magnesium),
        )
        .duplex_type(duplex_type)
        .concentration(
            values
                .concentration
                .or(file.concentration)
                .unwrap_or(defaults.concentration),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

fn resolve_evaluator(
    args: &PickArgs,
    mut file_config: FileConfig,
    defaults: &DefaultsConfig,
) -> Result<EvaluatorSource> {
    let file = file_config.evaluator.take().unwrap_or_default();
    let cli = &args.evaluator;

    // A source given on the command line replaces the file's source entirely.
    let (melt_command, thermo_dir) =
        if cli.source.melt_command.is_some() || cli.source.thermo_dir.is_some() {
            (cli.source.melt_command.clone(), cli.source.thermo_dir.clone())
        } else {
            (file.melt_command, file.thermo_dir)
        };

    match (melt_command, thermo_dir) {
        (Some(program), None) => {
            let args = if cli.melt_args.is_empty() {
                file.melt_args.unwrap_or_default()
            } else {
                cli.melt_args.clone()
            };
            Ok(EvaluatorSource::Command { program, args })
        }
        (None, Some(dir)) => {
            let mode = match &cli.fa_mode {
                Some(raw) => raw.parse().map_err(CliError::Argument)?,
                None => file.fa_mode.unwrap_or(defaults.fa_mode),
            };
            let raw_m_value = cli
                .fa_mvalue
                .as_deref()
                .or(file.fa_mvalue.as_deref())
                .unwrap_or(defaults.fa_mvalue.as_str());
            let m_value = MValue::from_str(raw_m_value)
                .map_err(|e| CliError::Argument(e.to_string()))?;
            Ok(EvaluatorSource::Thermo {
                dir,
                correction: FormamideCorrection { mode, m_value },
            })
        }
        (Some(_), Some(_)) => Err(CliError::Config(
            "`evaluator.melt-command` and `evaluator.thermo-dir` are mutually exclusive."
                .to_string(),
        )),
        (None, None) => Err(CliError::Config(
            "A melt evaluator is required: pass --melt-command or --thermo-dir, or set one in the [evaluator] section."
                .to_string(),
        )),
    }
}

fn parse_duplex_type(raw: &str) -> Result<DuplexType> {
    DuplexType::from_str(raw).map_err(|e| CliError::Argument(e.to_string()))
}

fn probe_name_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::Argument(format!(
                "Cannot derive a probe name from '{}'; use --name.",
                path.display()
            ))
        })
}

fn available_threads() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value))
    })
}

fn apply_stage_value(stage: &mut FileStageConfig, key: &str, field: &str, value: &str) -> Result<()> {
    match field {
        "temperature" => stage.temperature = Some(parse_value(key, value, "float")?),
        "step" => stage.step = Some(parse_value(key, value, "float")?),
        "min" => stage.min = Some(parse_value(key, value, "float")?),
        "max" => stage.max = Some(parse_value(key, value, "float")?),
        "formamide" => stage.formamide = Some(parse_value(key, value, "float")?),
        "sodium" => stage.sodium = Some(parse_value(key, value, "float")?),
        "magnesium" => stage.magnesium = Some(parse_value(key, value, "float")?),
        "concentration" => stage.concentration = Some(parse_value(key, value, "float")?),
        "duplex-type" => stage.duplex_type = Some(parse_value(key, value, "duplex type")?),
        _ => return Err(unsupported_key(key)),
    }
    Ok(())
}

fn apply_bystander_value(
    bystander: &mut FileBystanderConfig,
    key: &str,
    field: &str,
    value: &str,
) -> Result<()> {
    match field {
        "duplex-type" => bystander.duplex_type = Some(parse_value(key, value, "duplex type")?),
        "concentration" => bystander.concentration = Some(parse_value(key, value, "float")?),
        _ => return Err(unsupported_key(key)),
    }
    Ok(())
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!("Unsupported configuration key for --set: '{}'", key))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        if key == "structure" {
            config.structure = Some(value.to_string());
            continue;
        }

        let Some((section, field)) = key.split_once('.') else {
            return Err(unsupported_key(key));
        };
        match section {
            "h1" => apply_stage_value(
                config.h1.get_or_insert_with(Default::default),
                key,
                field,
                value,
            )?,
            "h2" => apply_stage_value(
                config.h2.get_or_insert_with(Default::default),
                key,
                field,
                value,
            )?,
            "bystander" => apply_bystander_value(
                config.bystander.get_or_insert_with(Default::default),
                key,
                field,
                value,
            )?,
            "sweep" => {
                let sweep = config.sweep.get_or_insert_with(Default::default);
                match field {
                    "parallel" => sweep.parallel = Some(parse_value(key, value, "boolean")?),
                    "threads" => sweep.threads = Some(parse_value(key, value, "integer")?),
                    "early-stop" => sweep.early_stop = Some(parse_value(key, value, "integer")?),
                    "tie-break" => sweep.tie_break = Some(parse_value(key, value, "policy")?),
                    "goodness" => sweep.goodness = Some(parse_value(key, value, "model")?),
                    _ => return Err(unsupported_key(key)),
                }
            }
            "evaluator" => {
                let evaluator = config.evaluator.get_or_insert_with(Default::default);
                match field {
                    "melt-command" => evaluator.melt_command = Some(value.into()),
                    "thermo-dir" => evaluator.thermo_dir = Some(value.into()),
                    "fa-mode" => evaluator.fa_mode = Some(parse_value(key, value, "mode")?),
                    "fa-mvalue" => evaluator.fa_mvalue = Some(value.to_string()),
                    _ => return Err(unsupported_key(key)),
                }
            }
            _ => return Err(unsupported_key(key)),
        }
    }
    Ok(config)
}
