use super::config::Stage;
use super::state::{ConditionScore, ScoreLedger, StageResult};
use crate::core::io::tsv::{self, TsvError};
use std::path::{Path, PathBuf};

/// Name of the per-condition goodness breakdown written in each namespace.
pub const OLIGO_SCORES_FILE: &str = "oligo.scores.tsv";

pub fn ledger_file_name(stage: Stage) -> String {
    format!("{}.temp.score.tsv", stage.label())
}

pub fn picked_file_name(stage: Stage) -> String {
    format!("{}.picked.tsv", stage.label())
}

/// `temperature  raw_score  normalized_score`, one row per ledger entry in
/// ledger order.
pub fn write_ledger<P: AsRef<Path>>(ledger: &ScoreLedger, path: P) -> Result<(), TsvError> {
    let mut writer = tsv::tab_writer(path)?;
    writer.write_record(["temperature", "raw_score", "normalized_score"])?;
    for entry in ledger {
        writer.write_record([
            format!("{:.2}", entry.temperature),
            format!("{:.6}", entry.raw_score),
            format!("{:.2}", entry.normalized_score),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// The single-row record of the condition picked for `result`'s stage.
pub fn write_picked<P: AsRef<Path>>(
    probe: &str,
    result: &StageResult,
    path: P,
) -> Result<(), TsvError> {
    let mut writer = tsv::tab_writer(path)?;
    writer.write_record([
        "probe",
        "score",
        "equivalent_FA",
        "default_temperature",
        "default_FA",
        "selected_temperature",
        "Na",
        "probe_concentration",
    ])?;
    let config = &result.config;
    writer.write_record([
        probe.to_string(),
        format!("{:.2}", result.best.score.normalized_score),
        format!("{:.2}", result.best.equivalent_formamide),
        format!("{:.2}", config.default_temperature()),
        format!("{:.2}", config.default_formamide()),
        format!("{:.2}", result.best.temperature()),
        config.condition.sodium.to_string(),
        config.condition.concentration.to_string(),
    ])?;
    writer.flush()?;
    Ok(())
}

pub fn write_oligo_scores<P: AsRef<Path>>(score: &ConditionScore, path: P) -> Result<(), TsvError> {
    let with_bystander = score.oligos.iter().any(|o| o.bystander.is_some());
    let mut writer = tsv::tab_writer(path)?;

    let mut header = vec!["name", "hybridization", "fold"];
    if with_bystander {
        header.push("bystander");
    }
    header.push("goodness");
    writer.write_record(&header)?;

    for oligo in &score.oligos {
        let mut row = vec![
            oligo.name.clone(),
            format!("{:.6}", oligo.hybridization),
            format!("{:.6}", oligo.fold),
        ];
        if with_bystander {
            row.push(oligo.bystander.map_or_else(
                || tsv::MISSING_VALUE.to_string(),
                |b| format!("{:.6}", b),
            ));
        }
        row.push(format!("{:.6}", oligo.goodness));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the ledger and picked record of every stage into `dir` and returns the
/// written paths.
pub fn write_stage_outputs(
    probe: &str,
    results: &[&StageResult],
    dir: &Path,
) -> Result<Vec<PathBuf>, TsvError> {
    let mut written = Vec::with_capacity(results.len() * 2);
    for result in results {
        let ledger = dir.join(ledger_file_name(result.stage()));
        write_ledger(&result.ledger, &ledger)?;
        written.push(ledger);

        let picked = dir.join(picked_file_name(result.stage()));
        write_picked(probe, result, &picked)?;
        written.push(picked);
    }
    Ok(written)
}
